//! Capacity growth shared by every buffer variant.

/// Target capacity when an append finds the buffer full.
///
/// Starts at 2 and then grows by roughly 1.5x: `(3 * current + 1) / 2`. The arithmetic
/// saturates; capacities that large are rejected by the layout computation anyway.
#[inline]
pub const fn next_capacity(current: usize) -> usize {
    if current == 0 {
        2
    } else {
        current.saturating_mul(3).saturating_add(1) / 2
    }
}

/// Target capacity for appending `additional` elements to `len` live ones, never above
/// `max`.
///
/// Returns `None` if the required capacity exceeds `max` or is not representable.
#[inline]
pub(crate) fn grow_target(
    len: usize,
    capacity: usize,
    additional: usize,
    max: usize,
) -> Option<usize> {
    let required = len.checked_add(additional)?;
    if required <= capacity {
        return Some(capacity);
    }
    if required > max {
        return None;
    }
    Some(required.max(next_capacity(capacity)).min(max))
}
