//! Buffer with an embedded region of `K` slots that spills to the heap when it overflows.
//!
//! An [`InlineBuffer`] is in exactly one of two modes:
//!
//! * **inline**: `capacity() == K` and the live elements sit in the embedded region;
//! * **heap**: `capacity() > K` and the live elements sit in a block from the allocator.
//!
//! The mode is derived from the stored heap capacity alone, which is zero while inline, so
//! there is no separate flag to keep in sync. Growing past `K` promotes to the heap;
//! [`shrink_to_fit`](Buffer::shrink_to_fit) with `len <= K` demotes back into the embedded
//! region and frees the block.
//!
//! Length and heap capacity are stored as the size type `S`, and `K` itself must fit in it.

use core::mem::{self, ManuallyDrop, MaybeUninit};
use core::ptr::NonNull;

use log::trace;

use crate::alloc::{Global, RawAlloc};
use crate::buffers::block::{release_block, resize_block};
use crate::contract::{AnyBuffer, Buffer, impl_buffer_common};
use crate::error::Result;
use crate::primitives::{destroy_range, move_construct_range};
use crate::size::{SizeType, to_size};

#[repr(C)]
union InlineData<T, const K: usize> {
    inline: ManuallyDrop<[MaybeUninit<T>; K]>,
    heap: NonNull<T>,
}

pub struct InlineBuffer<T, const K: usize, A: RawAlloc = Global, S: SizeType = usize> {
    len: S,
    heap_capacity: S,
    data: InlineData<T, K>,
    alloc: A,
}

impl<T, const K: usize> InlineBuffer<T, K> {
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, const K: usize, A: RawAlloc, S: SizeType> InlineBuffer<T, K, A, S> {
    pub const MAX_INLINE_BYTES: usize = 16 * 1024;

    pub const fn new_in(alloc: A) -> Self {
        const {
            assert!(K > 0, "InlineBuffer needs at least one inline slot");
            assert!(K <= S::MAX, "K does not fit in the size type");
            assert!(
                mem::size_of::<Self>() <= Self::MAX_INLINE_BYTES,
                "InlineBuffer is too large! Reduce K."
            );
        }
        Self {
            len: S::ZERO,
            heap_capacity: S::ZERO,
            data: InlineData {
                inline: ManuallyDrop::new([const { MaybeUninit::uninit() }; K]),
            },
            alloc,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Whether the live elements are in the embedded region.
    #[inline(always)]
    pub fn is_inline(&self) -> bool {
        self.heap_capacity == S::ZERO
    }

    /// Address of the embedded region, whichever mode is active.
    #[inline(always)]
    pub fn inline_ptr(&self) -> *const T {
        (&raw const self.data).cast()
    }

    #[inline(always)]
    fn inline_mut_ptr(&mut self) -> *mut T {
        (&raw mut self.data).cast()
    }

    /// The heap block. Only meaningful in heap mode.
    #[inline(always)]
    unsafe fn heap(&self) -> NonNull<T> {
        debug_assert!(!self.is_inline());
        unsafe { self.data.heap }
    }

    fn promote(&mut self, capacity: usize) -> Result<()> {
        let stored = to_size::<S>(capacity)?;
        let (block, slots) = resize_block(&self.alloc, None, capacity, false)?;
        debug_assert_eq!(slots, capacity);
        unsafe { move_construct_range(block.as_ptr(), self.inline_ptr(), self.len()) };
        trace!("inline buffer promoted to heap: {} -> {} slots", K, slots);
        self.data.heap = block;
        self.heap_capacity = stored;
        Ok(())
    }

    fn demote(&mut self) {
        let block = unsafe { self.heap() };
        let capacity = self.capacity();
        unsafe {
            move_construct_range(self.inline_mut_ptr(), block.as_ptr(), self.len());
            release_block(&self.alloc, block, capacity);
        }
        trace!("inline buffer demoted from heap: {} -> {} slots", capacity, K);
        self.heap_capacity = S::ZERO;
    }

    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        let stored = to_size::<S>(capacity)?;
        let block = unsafe { self.heap() };
        let (block, _) =
            resize_block(&self.alloc, Some((block, self.capacity())), capacity, false)?;
        self.data.heap = block;
        self.heap_capacity = stored;
        Ok(())
    }

    /// Hands the heap block of `heap_side` to `inline_side` and moves the elements of
    /// `inline_side` into the embedded region of `heap_side`.
    fn swap_mixed(heap_side: &mut Self, inline_side: &mut Self) {
        debug_assert!(!heap_side.is_inline() && inline_side.is_inline());
        let block = unsafe { heap_side.heap() };
        unsafe {
            move_construct_range(
                heap_side.inline_mut_ptr(),
                inline_side.inline_ptr(),
                inline_side.len(),
            )
        };
        inline_side.data.heap = block;
        inline_side.heap_capacity = heap_side.heap_capacity;
        heap_side.heap_capacity = S::ZERO;
    }

    /// Exchanges the contents of two embedded regions.
    ///
    /// When either side is empty the other side's elements move straight across.
    /// Otherwise the elements of `self` are parked in a temporary heap block rather than
    /// on the stack, since `K` slots may be large.
    fn swap_inline(&mut self, other: &mut Self) {
        let parked = self.len();
        let incoming = other.len();
        if parked == 0 {
            unsafe { move_construct_range(self.inline_mut_ptr(), other.inline_ptr(), incoming) };
            return;
        }
        if incoming == 0 {
            unsafe { move_construct_range(other.inline_mut_ptr(), self.inline_ptr(), parked) };
            return;
        }
        let scratch = match resize_block::<T, A>(&self.alloc, None, parked, false) {
            Ok((scratch, _)) => scratch,
            Err(err) => err.handle(),
        };
        trace!("inline swap parked {parked} elements in a temporary block");
        unsafe {
            move_construct_range(scratch.as_ptr(), self.inline_ptr(), parked);
            move_construct_range(self.inline_mut_ptr(), other.inline_ptr(), incoming);
            move_construct_range(other.inline_mut_ptr(), scratch.as_ptr(), parked);
            release_block(&self.alloc, scratch, parked);
        }
    }
}

impl<T, const K: usize, A: RawAlloc, S: SizeType> AnyBuffer<T> for InlineBuffer<T, K, A, S> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        unsafe { core::slice::from_raw_parts(Buffer::as_ptr(self), self.len()) }
    }

    #[inline]
    fn capacity(&self) -> usize {
        if self.is_inline() {
            K
        } else {
            self.heap_capacity.to_usize()
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len.to_usize()
    }
}

impl<T, const K: usize, A: RawAlloc, S: SizeType> Buffer<T> for InlineBuffer<T, K, A, S> {
    const MAX_CAPACITY: usize = S::MAX;

    #[inline]
    fn as_ptr(&self) -> *const T {
        if self.is_inline() {
            self.inline_ptr()
        } else {
            unsafe { self.heap().as_ptr() }
        }
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        if self.is_inline() {
            self.inline_mut_ptr()
        } else {
            unsafe { self.heap().as_ptr() }
        }
    }

    #[inline]
    unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = S::from_usize_truncating(len);
    }

    fn try_grow_to(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity > self.capacity());
        if self.is_inline() {
            self.promote(capacity)
        } else {
            self.reallocate(capacity)
        }
    }

    fn shrink_to_fit(&mut self) {
        if self.is_inline() {
            return;
        }
        let len = self.len();
        if len <= K {
            self.demote();
        } else if len < self.capacity() {
            if let Err(err) = self.reallocate(len) {
                err.handle();
            }
        }
    }

    fn swap_with(&mut self, other: &mut Self) {
        match (self.is_inline(), other.is_inline()) {
            (false, false) => {
                let block = unsafe { self.heap() };
                self.data.heap = unsafe { other.heap() };
                other.data.heap = block;
                mem::swap(&mut self.heap_capacity, &mut other.heap_capacity);
            }
            (false, true) => Self::swap_mixed(self, other),
            (true, false) => Self::swap_mixed(other, self),
            (true, true) => self.swap_inline(other),
        }
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.alloc, &mut other.alloc);
    }
}

impl<T, const K: usize, A: RawAlloc + Default, S: SizeType> Default for InlineBuffer<T, K, A, S> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, const K: usize, A: RawAlloc, S: SizeType> Drop for InlineBuffer<T, K, A, S> {
    fn drop(&mut self) {
        unsafe { destroy_range(self.as_mut_ptr(), self.len()) };
        if !self.is_inline() {
            unsafe { release_block(&self.alloc, self.heap(), self.capacity()) };
        }
    }
}

impl_buffer_common!([T, const K: usize, A: RawAlloc, S: SizeType] InlineBuffer<T, K, A, S>);
