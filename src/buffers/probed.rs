//! Split-field buffer that adopts the allocator's usable size as its capacity.
//!
//! Same layout as [`SplitBuffer`](crate::SplitBuffer). Every allocation and reallocation
//! goes through the probing calls of [`RawAlloc`], so when the allocator rounds a request
//! up to a size class the extra slots become capacity instead of waste. The block is
//! released with the tracked capacity, which size-aware allocators can use directly.
//! Adopted capacity is capped at what the size type `S` can record.

use core::mem;
use core::ptr::NonNull;

use log::trace;

use crate::alloc::{Global, RawAlloc};
use crate::buffers::block::{release_block, resize_block};
use crate::contract::{AnyBuffer, Buffer, impl_buffer_common};
use crate::error::Result;
use crate::primitives::destroy_range;
use crate::size::{SizeType, to_size};

pub struct ProbedBuffer<T, A: RawAlloc = Global, S: SizeType = usize> {
    ptr: Option<NonNull<T>>,
    len: S,
    capacity: S,
    alloc: A,
}

impl<T> ProbedBuffer<T> {
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A: RawAlloc, S: SizeType> ProbedBuffer<T, A, S> {
    pub const fn new_in(alloc: A) -> Self {
        Self {
            ptr: None,
            len: S::ZERO,
            capacity: S::ZERO,
            alloc,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.ptr.is_some()
    }

    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity >= self.len());
        to_size::<S>(capacity)?;
        let old = self.ptr.map(|ptr| (ptr, self.capacity()));
        let (ptr, slots) = resize_block(&self.alloc, old, capacity, true)?;
        let slots = slots.min(S::MAX);
        if slots != capacity {
            trace!("probed capacity: requested {capacity}, adopted {slots}");
        }
        self.ptr = Some(ptr);
        self.capacity = S::from_usize_truncating(slots);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            unsafe { release_block(&self.alloc, ptr, self.capacity()) };
        }
        self.capacity = S::ZERO;
    }
}

impl<T, A: RawAlloc, S: SizeType> AnyBuffer<T> for ProbedBuffer<T, A, S> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        unsafe { core::slice::from_raw_parts(Buffer::as_ptr(self), self.len()) }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity.to_usize()
    }

    #[inline]
    fn len(&self) -> usize {
        self.len.to_usize()
    }
}

impl<T, A: RawAlloc, S: SizeType> Buffer<T> for ProbedBuffer<T, A, S> {
    const MAX_CAPACITY: usize = S::MAX;

    #[inline]
    fn as_ptr(&self) -> *const T {
        self.ptr.unwrap_or(NonNull::dangling()).as_ptr()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.unwrap_or(NonNull::dangling()).as_ptr()
    }

    #[inline]
    unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = S::from_usize_truncating(len);
    }

    fn try_grow_to(&mut self, capacity: usize) -> Result<()> {
        self.reallocate(capacity)
    }

    fn shrink_to_fit(&mut self) {
        let len = self.len();
        if len == 0 {
            self.release();
        } else if len != self.capacity() {
            // the allocator may hand back the same size class; capacity still tracks it
            if let Err(err) = self.reallocate(len) {
                err.handle();
            }
        }
    }

    fn swap_with(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T, A: RawAlloc + Default, S: SizeType> Default for ProbedBuffer<T, A, S> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A: RawAlloc, S: SizeType> Drop for ProbedBuffer<T, A, S> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr {
            unsafe { destroy_range(ptr.as_ptr(), self.len()) };
            self.len = S::ZERO;
            self.release();
        }
    }
}

impl_buffer_common!([T, A: RawAlloc, S: SizeType] ProbedBuffer<T, A, S>);
