#![forbid(unsafe_code)]

//! Shift planning for drag reflow.
//!
//! When the dragged tile's tentative slot moves from linear index `prev` to
//! `to`, every tile strictly between the two slots (plus the one at `to`)
//! shifts by one toward `prev`, keeping the layout contiguous.
//!
//! # Invariants
//!
//! 1. Forward (`prev < to`): affected tiles are exactly those with index in
//!    `(prev, to]`, and each moves to `index - 1`.
//! 2. Backward (`prev > to`): affected tiles are exactly those with index in
//!    `[to, prev)`, and each moves to `index + 1`.
//! 3. `prev == to` affects nothing.
//! 4. The dragged tile itself is never planned.
//! 5. Applying a plan to a contiguous layout and placing the dragged tile at
//!    `to` yields a contiguous layout again.

/// Direction of a reflow relative to row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflowDirection {
    /// Dragged toward higher indices; intervening tiles move back.
    Forward,
    /// Dragged toward lower indices; intervening tiles move ahead.
    Backward,
}

impl ReflowDirection {
    /// Direction for a crossing from `prev` to `to`, or `None` if equal.
    #[must_use]
    pub const fn between(prev: u32, to: u32) -> Option<Self> {
        if to > prev {
            Some(Self::Forward)
        } else if to < prev {
            Some(Self::Backward)
        } else {
            None
        }
    }
}

/// One tile move decided by [`plan_reflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMove<T> {
    /// Tile being shifted.
    pub tile: T,
    /// Linear index before the shift.
    pub from_index: u32,
    /// Linear index after the shift.
    pub to_index: u32,
}

/// New linear index for a tile at `real` when the dragged tile crosses from
/// `prev` to `to`, or `None` if the tile stays put.
#[must_use]
pub const fn shift_target(prev: u32, to: u32, real: u32) -> Option<u32> {
    if to > prev && prev < real && real <= to {
        Some(real - 1)
    } else if to < prev && to <= real && real < prev {
        Some(real + 1)
    } else {
        None
    }
}

/// Plan the shifts for a crossing from `prev` to `to`.
///
/// `tiles` yields `(tile, linear_index)` for every loaded tile; `moving` is
/// skipped. Output preserves input order.
pub fn plan_reflow<T, I>(prev: u32, to: u32, moving: T, tiles: I) -> Vec<PlannedMove<T>>
where
    T: Copy + PartialEq,
    I: IntoIterator<Item = (T, u32)>,
{
    tiles
        .into_iter()
        .filter(|(tile, _)| *tile != moving)
        .filter_map(|(tile, real)| {
            shift_target(prev, to, real).map(|to_index| PlannedMove {
                tile,
                from_index: real,
                to_index,
            })
        })
        .collect()
}

/// Whether `indices` is exactly a permutation of `0..indices.len()`.
#[must_use]
pub fn is_contiguous(indices: &[u32]) -> bool {
    let n = indices.len();
    let mut seen = vec![false; n];
    for &idx in indices {
        let Some(slot) = seen.get_mut(idx as usize) else {
            return false;
        };
        if *slot {
            return false;
        }
        *slot = true;
    }
    true
}
