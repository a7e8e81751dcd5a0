//! Heap-only buffer that stores its length and capacity in front of the elements.
//!
//! A [`HeaderBuffer`] is a single pointer. It points at the first element of a block laid
//! out as `[Header][T; capacity]`, and the header is found at a fixed negative offset from
//! that pointer. The offset is the header size rounded up to `align_of::<T>()`, so the
//! element array keeps its alignment. An empty, never-allocated buffer holds no pointer at
//! all, so every metadata read checks for that first.
//!
//! The header fields use the size type `S`, so `HeaderBuffer<T, Global, u16>` carries a
//! four-byte header (padded to `T`'s alignment) and holds at most `u16::MAX` elements.
//!
//! Growing resizes the whole block with one reallocation: Rust moves are bitwise, so the
//! elements may travel with the header no matter what `T` is.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use log::trace;

use crate::alloc::{Global, RawAlloc, array_layout};
use crate::contract::{AnyBuffer, Buffer, impl_buffer_common};
use crate::error::{BufferError, Result};
use crate::primitives::destroy_range;
use crate::size::{SizeType, to_size};

/// Metadata stored at the start of every block.
#[repr(C)]
struct Header<S> {
    len: S,
    capacity: S,
}

/// Distance in bytes from the start of the block to the first element.
const fn data_offset<T, S>() -> usize {
    let align = mem::align_of::<T>();
    mem::size_of::<Header<S>>().div_ceil(align) * align
}

/// Layout of a block holding the header and `capacity` elements.
fn block_layout<T, S>(capacity: usize) -> Result<Layout> {
    let (layout, offset) = Layout::new::<Header<S>>()
        .extend(array_layout::<T>(capacity)?)
        .map_err(|_| BufferError::CapacityOverflow)?;
    debug_assert_eq!(offset, data_offset::<T, S>());
    Ok(layout.pad_to_align())
}

pub struct HeaderBuffer<T, A: RawAlloc = Global, S: SizeType = usize> {
    data: Option<NonNull<T>>,
    alloc: A,
    _marker: PhantomData<(T, S)>,
}

impl<T> HeaderBuffer<T> {
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A: RawAlloc, S: SizeType> HeaderBuffer<T, A, S> {
    pub const fn new_in(alloc: A) -> Self {
        Self {
            data: None,
            alloc,
            _marker: PhantomData,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Whether a block (header plus elements) is currently owned.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    #[inline]
    fn header(data: NonNull<T>) -> NonNull<Header<S>> {
        unsafe { data.cast::<u8>().sub(data_offset::<T, S>()).cast() }
    }

    #[inline]
    fn read_header(&self) -> Option<&Header<S>> {
        self.data.map(|data| unsafe { Self::header(data).as_ref() })
    }

    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity >= self.len());
        let stored = to_size::<S>(capacity)?;
        let layout = block_layout::<T, S>(capacity)?;
        let block = match self.data {
            None => {
                let block = self.alloc.allocate(layout)?;
                let header = Header {
                    len: S::ZERO,
                    capacity: stored,
                };
                unsafe { block.cast::<Header<S>>().write(header) };
                block
            }
            Some(data) => {
                let old_capacity = self.capacity();
                let old = block_layout::<T, S>(old_capacity)?;
                trace!("reallocating header block: {old_capacity} -> {capacity} slots");
                let block = unsafe {
                    self.alloc
                        .reallocate(Self::header(data).cast(), old, layout.size())?
                };
                unsafe { (*block.cast::<Header<S>>().as_ptr()).capacity = stored };
                block
            }
        };
        self.data = Some(unsafe { block.add(data_offset::<T, S>()).cast() });
        Ok(())
    }

    fn release(&mut self) {
        if let Some(data) = self.data.take() {
            let capacity = unsafe { Self::header(data).as_ref().capacity.to_usize() };
            if let Ok(layout) = block_layout::<T, S>(capacity) {
                unsafe { self.alloc.deallocate(Self::header(data).cast(), layout) };
            }
        }
    }
}

impl<T, A: RawAlloc, S: SizeType> AnyBuffer<T> for HeaderBuffer<T, A, S> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        unsafe { core::slice::from_raw_parts(Buffer::as_ptr(self), self.len()) }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.read_header().map_or(0, |header| header.capacity.to_usize())
    }

    #[inline]
    fn len(&self) -> usize {
        self.read_header().map_or(0, |header| header.len.to_usize())
    }
}

impl<T, A: RawAlloc, S: SizeType> Buffer<T> for HeaderBuffer<T, A, S> {
    const MAX_CAPACITY: usize = S::MAX;

    #[inline]
    fn as_ptr(&self) -> *const T {
        self.data.unwrap_or(NonNull::dangling()).as_ptr()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.data.unwrap_or(NonNull::dangling()).as_ptr()
    }

    #[inline]
    unsafe fn set_len(&mut self, len: usize) {
        match self.data {
            Some(data) => unsafe {
                let header = Self::header(data).as_ptr();
                debug_assert!(len <= (*header).capacity.to_usize());
                (*header).len = S::from_usize_truncating(len);
            },
            None => debug_assert_eq!(len, 0),
        }
    }

    fn try_grow_to(&mut self, capacity: usize) -> Result<()> {
        self.reallocate(capacity)
    }

    fn shrink_to_fit(&mut self) {
        let len = self.len();
        if len == 0 {
            self.release();
        } else if len < self.capacity() {
            if let Err(err) = self.reallocate(len) {
                err.handle();
            }
        }
    }

    fn swap_with(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T, A: RawAlloc + Default, S: SizeType> Default for HeaderBuffer<T, A, S> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A: RawAlloc, S: SizeType> Drop for HeaderBuffer<T, A, S> {
    fn drop(&mut self) {
        if let Some(data) = self.data {
            unsafe { destroy_range(data.as_ptr(), self.len()) };
            self.release();
        }
    }
}

impl_buffer_common!([T, A: RawAlloc, S: SizeType] HeaderBuffer<T, A, S>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BufferError;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_header_buffer_is_one_pointer() {
        assert_eq!(
            mem::size_of::<HeaderBuffer<u64>>(),
            mem::size_of::<usize>()
        );
        assert_eq!(
            mem::size_of::<HeaderBuffer<String>>(),
            mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_header_empty_reads_without_block() {
        let buf: HeaderBuffer<u8> = HeaderBuffer::new();
        assert!(!buf.is_allocated());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);
        assert!(buf.try_front().is_err());
        assert_eq!(buf.iter().count(), 0);
    }

    #[test]
    fn test_header_metadata_lives_before_elements() {
        let mut buf: HeaderBuffer<u32> = HeaderBuffer::new();
        buf.extend_from_slice(&[1, 2, 3]);
        let data = buf.as_ptr() as usize;
        let header = HeaderBuffer::<u32>::header(buf.data.unwrap()).as_ptr() as usize;
        assert_eq!(data - header, data_offset::<u32, usize>());
        assert_eq!(unsafe { (*(header as *const Header<usize>)).len }, 3);
    }

    #[test]
    fn test_header_over_aligned_elements() {
        #[derive(Clone, Copy, Debug, PartialEq)]
        #[repr(align(64))]
        struct Wide(u8);

        assert_eq!(data_offset::<Wide, usize>(), 64);
        assert_eq!(data_offset::<Wide, u8>(), 64);
        let mut buf: HeaderBuffer<Wide> = HeaderBuffer::new();
        for i in 0..10 {
            buf.push(Wide(i));
            assert_eq!(buf.as_ptr() as usize % 64, 0);
        }
        assert_eq!(buf[9], Wide(9));
    }

    #[test]
    fn test_header_grow_shrink_and_release() {
        let mut buf: HeaderBuffer<String> = HeaderBuffer::new();
        buf.resize(6, "x".to_string());
        assert_eq!(buf.capacity(), 6);
        buf.push("y".to_string());
        assert_eq!(buf.capacity(), 9);
        buf.truncate(2);
        buf.shrink_to_fit();
        assert_eq!(buf.capacity(), 2);
        assert_eq!(buf.as_slice(), &["x", "x"]);
        buf.finalize();
        assert!(!buf.is_allocated());
    }

    #[test]
    fn test_header_drop_destroys_elements() {
        let drops = Rc::new(Cell::new(0));

        struct Dropper(Rc<Cell<i32>>);
        impl Drop for Dropper {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        {
            let mut buf: HeaderBuffer<Dropper> = HeaderBuffer::new();
            for _ in 0..5 {
                buf.push(Dropper(drops.clone()));
            }
            buf.erase(0);
            assert_eq!(drops.get(), 1);
        }
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn test_header_move_and_swap_are_pointer_moves() {
        let mut a: HeaderBuffer<i32> = HeaderBuffer::from_slice(&[1, 2]);
        let mut b: HeaderBuffer<i32> = HeaderBuffer::new();
        let pa = a.as_ptr();
        a.swap_with(&mut b);
        assert!(!a.is_allocated());
        assert_eq!(b.as_ptr(), pa);

        let moved = b.take();
        assert_eq!(moved.as_slice(), &[1, 2]);
        assert!(!b.is_allocated());
    }

    #[test]
    fn test_header_narrow_size_type() {
        assert_eq!(data_offset::<u8, u16>(), 4);
        assert_eq!(data_offset::<u64, u16>(), 8);
        assert_eq!(
            mem::size_of::<HeaderBuffer<u8, Global, u16>>(),
            mem::size_of::<usize>()
        );

        let mut buf: HeaderBuffer<u8, Global, u8> = HeaderBuffer::new_in(Global);
        buf.resize(200, 1);
        let header = HeaderBuffer::<u8, Global, u8>::header(buf.data.unwrap()).as_ptr();
        assert_eq!(unsafe { (*header).len }, 200u8);
        assert_eq!(unsafe { (*header).capacity }, 200u8);

        // next_capacity(200) = 300 is clamped to the u8 ceiling
        buf.push(2);
        assert_eq!(buf.capacity(), 255);
        assert_eq!(buf.try_reserve(256), Err(BufferError::CapacityOverflow));
        buf.resize(255, 3);
        assert_eq!(buf.try_push(4), Err(BufferError::CapacityOverflow));
        assert_eq!(buf.len(), 255);
        assert_eq!(buf[200], 2);
    }
}
