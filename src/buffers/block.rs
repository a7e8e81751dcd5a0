//! Heap blocks of bare `T` slots, shared by the variants that keep their metadata outside
//! the allocation.

use core::mem;
use core::ptr::NonNull;

use log::trace;

use crate::alloc::{RawAlloc, array_layout};
use crate::error::Result;

/// Creates a block (`block == None`) or resizes an existing one to `capacity` slots.
///
/// With `adopt_usable` set, the allocator's usable size is adopted and the returned slot count
/// may exceed `capacity`. Zero-sized `T` never touches the allocator.
pub(crate) fn resize_block<T, A: RawAlloc>(
    alloc: &A,
    block: Option<(NonNull<T>, usize)>,
    capacity: usize,
    adopt_usable: bool,
) -> Result<(NonNull<T>, usize)> {
    debug_assert!(capacity > 0);
    let layout = array_layout::<T>(capacity)?;
    if layout.size() == 0 {
        return Ok((NonNull::dangling(), capacity));
    }
    let (raw, usable) = match block {
        None if adopt_usable => alloc.allocate_probed(layout)?,
        None => (alloc.allocate(layout)?, layout.size()),
        Some((ptr, old_capacity)) => {
            let old = array_layout::<T>(old_capacity)?;
            trace!(
                "reallocating block: {} -> {} slots of {} bytes",
                old_capacity,
                capacity,
                mem::size_of::<T>()
            );
            unsafe {
                if adopt_usable {
                    alloc.reallocate_probed(ptr.cast(), old, layout.size())?
                } else {
                    (alloc.reallocate(ptr.cast(), old, layout.size())?, layout.size())
                }
            }
        }
    };
    let slots = if adopt_usable {
        usable / mem::size_of::<T>()
    } else {
        capacity
    };
    debug_assert!(slots >= capacity);
    Ok((raw.cast(), slots))
}

/// Returns a block of `capacity` slots to the allocator.
///
/// # Safety
///
/// `ptr` must come from [`resize_block`] with the same allocator and slot count, and its
/// slots must hold no live values.
pub(crate) unsafe fn release_block<T, A: RawAlloc>(alloc: &A, ptr: NonNull<T>, capacity: usize) {
    if let Ok(layout) = array_layout::<T>(capacity) {
        if layout.size() != 0 {
            unsafe { alloc.deallocate(ptr.cast(), layout) };
        }
    }
}
