#![forbid(unsafe_code)]

//! Grid position model.
//!
//! Pure coordinate math between pixel space and the discrete tile grid.
//! Cells are addressed by [`ItemPosition`] (row, col) and linearized in
//! row-major order over the grid's column count.
//!
//! # Invariants
//!
//! 1. [`GridMetrics::col_count`] is always at least 1.
//! 2. `position_of(index_of(p, c), c) == p` whenever `p.col < c`.
//! 3. [`GridMetrics::clamp`] output always lies inside the grid for a
//!    non-empty tile count.
//!
//! # Failure Modes
//!
//! - Non-positive or non-finite cell sizes are treated as 1px so floor
//!   division never yields NaN or infinity.
//! - Negative pixel coordinates floor to negative cells internally and clamp
//!   to row/col 0.

/// A discrete grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPosition {
    /// Zero-based row.
    pub row: u32,
    /// Zero-based column.
    pub col: u32,
}

impl ItemPosition {
    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Row-major linear index of this cell for a grid with `col_count` columns.
    #[inline]
    #[must_use]
    pub const fn index(self, col_count: u32) -> u32 {
        index_of(self, col_count)
    }
}

impl std::fmt::Display for ItemPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

/// Cumulative pointer displacement since a drag began, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemOffset {
    /// Horizontal displacement (positive = right).
    pub delta_x: f64,
    /// Vertical displacement (positive = down).
    pub delta_y: f64,
}

impl ItemOffset {
    /// No displacement.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new offset.
    #[inline]
    #[must_use]
    pub const fn new(delta_x: f64, delta_y: f64) -> Self {
        Self { delta_x, delta_y }
    }

    /// Add an incremental pointer movement.
    #[inline]
    #[must_use]
    pub fn accumulate(self, movement_x: f64, movement_y: f64) -> Self {
        Self::new(self.delta_x + movement_x, self.delta_y + movement_y)
    }

    /// Whether both components are zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.delta_x == 0.0 && self.delta_y == 0.0
    }
}

/// Measured pixel box of a tile as reported by the rendering shell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TileGeometry {
    /// Left edge relative to the container.
    pub offset_left: f64,
    /// Top edge relative to the container.
    pub offset_top: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

impl TileGeometry {
    /// Create a new geometry.
    #[inline]
    #[must_use]
    pub const fn new(offset_left: f64, offset_top: f64, width: f64, height: f64) -> Self {
        Self {
            offset_left,
            offset_top,
            width,
            height,
        }
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

#[inline]
fn sanitize_extent(extent: f64) -> f64 {
    if extent.is_finite() && extent > 0.0 {
        extent
    } else {
        1.0
    }
}

/// Signed cell coordinates (row, col) of a pixel point; may be negative.
#[inline]
fn raw_cell(offset_x: f64, offset_y: f64, cell_width: f64, cell_height: f64) -> (i64, i64) {
    let row = (offset_y / sanitize_extent(cell_height)).floor();
    let col = (offset_x / sanitize_extent(cell_width)).floor();
    (row as i64, col as i64)
}

/// Cell containing the pixel point `(offset_x, offset_y)`.
///
/// `row = floor(offset_y / cell_height)`, `col = floor(offset_x / cell_width)`.
/// Points left of or above the origin land in row/col 0.
#[must_use]
pub fn cell_of(offset_x: f64, offset_y: f64, cell_width: f64, cell_height: f64) -> ItemPosition {
    let (row, col) = raw_cell(offset_x, offset_y, cell_width, cell_height);
    ItemPosition::new(saturate_u32(row), saturate_u32(col))
}

/// Clamp `pos` to `[0, col_count-1] x [0, row_count-1]`.
///
/// Zero counts are treated as 1.
#[inline]
#[must_use]
pub fn clamp(pos: ItemPosition, col_count: u32, row_count: u32) -> ItemPosition {
    ItemPosition::new(
        pos.row.min(row_count.max(1) - 1),
        pos.col.min(col_count.max(1) - 1),
    )
}

/// Row-major linear index: `row * col_count + col`, saturating at `u32::MAX`.
#[inline]
#[must_use]
pub const fn index_of(pos: ItemPosition, col_count: u32) -> u32 {
    pos.row.saturating_mul(col_count).saturating_add(pos.col)
}

/// Inverse of [`index_of`].
#[inline]
#[must_use]
pub const fn position_of(index: u32, col_count: u32) -> ItemPosition {
    let cols = if col_count == 0 { 1 } else { col_count };
    ItemPosition::new(index / cols, index % cols)
}

#[inline]
fn saturate_u32(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

// ---------------------------------------------------------------------------
// GridMetrics
// ---------------------------------------------------------------------------

/// Uniform cell size and container width of a tile grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    /// Width of one cell in pixels.
    pub cell_width: f64,
    /// Height of one cell in pixels.
    pub cell_height: f64,
    /// Inner width of the container in pixels.
    pub container_width: f64,
}

impl GridMetrics {
    /// Create new metrics.
    #[must_use]
    pub const fn new(cell_width: f64, cell_height: f64, container_width: f64) -> Self {
        Self {
            cell_width,
            cell_height,
            container_width,
        }
    }

    /// Metrics whose cell size matches a measured tile box.
    #[must_use]
    pub const fn from_tile(tile: &TileGeometry, container_width: f64) -> Self {
        Self::new(tile.width, tile.height, container_width)
    }

    /// Number of columns: `floor(container_width / cell_width)`, at least 1.
    #[must_use]
    pub fn col_count(&self) -> u32 {
        let cols = (self.container_width / sanitize_extent(self.cell_width)).floor();
        if cols.is_finite() && cols >= 1.0 {
            saturate_u32(cols as i64)
        } else {
            1
        }
    }

    /// Number of rows needed for `tile_count` tiles: `ceil(tile_count / col_count)`.
    #[must_use]
    pub fn row_count(&self, tile_count: usize) -> u32 {
        let cols = self.col_count() as usize;
        saturate_u32(tile_count.div_ceil(cols) as i64)
    }

    /// Cell containing a pixel point.
    #[inline]
    #[must_use]
    pub fn cell_of(&self, offset_x: f64, offset_y: f64) -> ItemPosition {
        cell_of(offset_x, offset_y, self.cell_width, self.cell_height)
    }

    /// Resting cell of a tile from its measured top-left corner.
    #[inline]
    #[must_use]
    pub fn rest_cell(&self, tile: &TileGeometry) -> ItemPosition {
        self.cell_of(tile.offset_left, tile.offset_top)
    }

    /// Cell containing a pixel point, clamped to a grid holding `tile_count` tiles.
    #[must_use]
    pub fn clamped_cell_of(&self, offset_x: f64, offset_y: f64, tile_count: usize) -> ItemPosition {
        clamp(
            self.cell_of(offset_x, offset_y),
            self.col_count(),
            self.row_count(tile_count),
        )
    }

    /// Clamped cell under the center of a tile resting at `origin` and
    /// displaced by `offset`.
    ///
    /// The center rather than the top-left corner decides the hovered cell,
    /// so a tile has to cross halfway into a neighbor before it counts.
    #[must_use]
    pub fn center_cell(&self, origin: ItemPosition, offset: ItemOffset, tile_count: usize) -> ItemPosition {
        let w = sanitize_extent(self.cell_width);
        let h = sanitize_extent(self.cell_height);
        let center_x = f64::from(origin.col) * w + offset.delta_x + w / 2.0;
        let center_y = f64::from(origin.row) * h + offset.delta_y + h / 2.0;
        self.clamped_cell_of(center_x, center_y, tile_count)
    }

    /// Row-major linear index under these metrics.
    #[inline]
    #[must_use]
    pub fn index_of(&self, pos: ItemPosition) -> u32 {
        index_of(pos, self.col_count())
    }

    /// Inverse of [`GridMetrics::index_of`].
    #[inline]
    #[must_use]
    pub fn position_of(&self, index: u32) -> ItemPosition {
        position_of(index, self.col_count())
    }
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self::new(200.0, 200.0, 800.0)
    }
}
