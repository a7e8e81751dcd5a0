//! Element lifecycle primitives over raw, partially initialized memory.
//!
//! Every buffer variant keeps slots `[0, len)` initialized and `[len, capacity)` raw. These
//! helpers are the only places that construct, move, shift or destroy elements in those
//! slots. Each one is `unsafe`: the caller promises the target range is fully raw
//! (construct) or fully live (destroy). Breaking that promise is undefined behavior, not a
//! reported error.
//!
//! A Rust move is always a bitwise copy, so every `T` is trivially relocatable: moving and
//! shifting never run user code. What differs per type is duplication and destruction.
//! [`copy_construct_range`] clones element by element, [`copy_bitwise_range`] is the raw
//! fast path for `Copy` types, and [`destroy_range`] is a no-op when `T` has no drop glue.

use core::mem;
use core::ptr;

/// Whether destroying a `T` runs any code. Folded at compile time.
#[inline(always)]
pub const fn needs_destroy<T>() -> bool {
    mem::needs_drop::<T>()
}

/// Constructs `value` in the raw slot at `dst`.
///
/// # Safety
///
/// `dst` must be valid for writes, aligned, and must not hold a live value.
#[inline(always)]
pub unsafe fn construct_at<T>(dst: *mut T, value: T) {
    unsafe { ptr::write(dst, value) }
}

/// Clones `src` front to back into the raw slots starting at `dst`.
///
/// If a `clone` panics, the elements already written are leaked, never dropped.
///
/// # Safety
///
/// `dst` must be valid for `src.len()` writes and must not overlap `src`.
#[inline]
pub unsafe fn copy_construct_range<T: Clone>(dst: *mut T, src: &[T]) {
    for (i, item) in src.iter().enumerate() {
        unsafe { dst.add(i).write(item.clone()) };
    }
}

/// Raw byte copy of `src` into the slots starting at `dst`.
///
/// # Safety
///
/// `dst` must be valid for `src.len()` writes and must not overlap `src`.
#[inline]
pub unsafe fn copy_bitwise_range<T: Copy>(dst: *mut T, src: &[T]) {
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len()) }
}

/// Moves `count` elements from `src` into the raw slots at `dst`.
///
/// Afterwards the source slots are logically raw: the caller must not read or drop them.
///
/// # Safety
///
/// Both ranges must be valid for `count` elements and must not overlap. `src` must hold
/// live values.
#[inline]
pub unsafe fn move_construct_range<T>(dst: *mut T, src: *const T, count: usize) {
    unsafe { ptr::copy_nonoverlapping(src, dst, count) }
}

/// Shifts `count` live elements from `src` to `dst` inside one allocation.
///
/// The ranges may overlap. Elements move in ascending order when `dst` precedes `src` and
/// in descending order otherwise, so no element is clobbered before it has moved. Types
/// without drop glue take a single `memmove`.
///
/// # Safety
///
/// Both ranges must lie within the same allocation. `src` must hold live values, and the
/// part of `dst` outside `src` must be raw.
#[inline]
pub unsafe fn relocate_in_place<T>(dst: *mut T, src: *mut T, count: usize) {
    if count == 0 || ptr::eq(dst, src) {
        return;
    }
    if !needs_destroy::<T>() {
        unsafe { ptr::copy(src, dst, count) };
        return;
    }
    unsafe {
        if dst < src {
            for i in 0..count {
                ptr::write(dst.add(i), ptr::read(src.add(i)));
            }
        } else {
            for i in (0..count).rev() {
                ptr::write(dst.add(i), ptr::read(src.add(i)));
            }
        }
    }
}

/// Destroys `count` live elements starting at `begin`.
///
/// # Safety
///
/// The range must hold live values that are never read again.
#[inline]
pub unsafe fn destroy_range<T>(begin: *mut T, count: usize) {
    if needs_destroy::<T>() && count > 0 {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(begin, count)) }
    }
}

/// Constructs `count` values produced by `make` into the raw slots at `dst`.
///
/// # Safety
///
/// `dst` must be valid for `count` writes.
#[inline]
pub unsafe fn construct_with<T, F: FnMut() -> T>(dst: *mut T, count: usize, mut make: F) {
    for i in 0..count {
        unsafe { dst.add(i).write(make()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::MaybeUninit;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked {
        value: u32,
        drops: Rc<Cell<usize>>,
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            Tracked {
                value: self.value,
                drops: self.drops.clone(),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn test_copy_construct_range_clones_in_order() {
        let drops = Rc::new(Cell::new(0));
        let src: Vec<Tracked> = (0..4)
            .map(|value| Tracked {
                value,
                drops: drops.clone(),
            })
            .collect();
        let mut slots: [MaybeUninit<Tracked>; 4] = [const { MaybeUninit::uninit() }; 4];
        let dst = slots.as_mut_ptr().cast::<Tracked>();
        unsafe {
            copy_construct_range(dst, &src);
            let values: Vec<u32> = (0..4).map(|i| (*dst.add(i)).value).collect();
            assert_eq!(values, vec![0, 1, 2, 3]);
            destroy_range(dst, 4);
        }
        assert_eq!(drops.get(), 4);
        drop(src);
        assert_eq!(drops.get(), 8);
    }

    #[test]
    fn test_copy_bitwise_range() {
        let src = [7u64, 8, 9];
        let mut dst = [0u64; 3];
        unsafe { copy_bitwise_range(dst.as_mut_ptr(), &src) };
        assert_eq!(dst, src);
    }

    #[test]
    fn test_relocate_in_place_down_and_up() {
        let mut words = [1u32, 2, 3, 4, 5, 0];
        let base = words.as_mut_ptr();
        unsafe { relocate_in_place(base, base.add(1), 4) };
        assert_eq!(&words[..4], &[2, 3, 4, 5]);

        let mut words = [1u32, 2, 3, 4, 5, 0];
        let base = words.as_mut_ptr();
        unsafe { relocate_in_place(base.add(1), base, 5) };
        assert_eq!(&words[1..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_relocate_in_place_drop_types_overlap() {
        let mut slots: [MaybeUninit<String>; 5] = [const { MaybeUninit::uninit() }; 5];
        let base = slots.as_mut_ptr().cast::<String>();
        unsafe {
            for i in 0..4 {
                construct_at(base.add(i), format!("s{i}"));
            }
            // shift up by one, opening a hole at 0
            relocate_in_place(base.add(1), base, 4);
            construct_at(base, "head".to_string());
            let seen: Vec<&str> = (0..5).map(|i| (*base.add(i)).as_str()).collect();
            assert_eq!(seen, vec!["head", "s0", "s1", "s2", "s3"]);

            // drop the head and close the gap
            destroy_range(base, 1);
            relocate_in_place(base, base.add(1), 4);
            let seen: Vec<&str> = (0..4).map(|i| (*base.add(i)).as_str()).collect();
            assert_eq!(seen, vec!["s0", "s1", "s2", "s3"]);
            destroy_range(base, 4);
        }
    }

    #[test]
    fn test_construct_with_and_needs_destroy() {
        assert!(!needs_destroy::<u8>());
        assert!(needs_destroy::<String>());

        let mut next = 10;
        let mut out = [0i32; 3];
        unsafe {
            construct_with(out.as_mut_ptr(), 3, || {
                next += 1;
                next
            })
        };
        assert_eq!(out, [11, 12, 13]);
    }
}
