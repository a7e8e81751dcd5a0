//! The allocator surface the buffers are written against.
//!
//! A buffer never names a concrete allocator. It asks a [`RawAlloc`] for raw blocks,
//! optionally with the allocator's own idea of how many bytes are actually usable, and
//! always hands the layout back on release so size-aware allocators can skip a lookup.
//!
//! [`Global`] forwards to the Rust global allocator. With the `malloc` feature enabled,
//! [`Malloc`] goes straight to libc and reports `malloc_usable_size` on Linux, which is
//! what makes [`ProbedBuffer`](crate::ProbedBuffer) interesting.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::{BufferError, Result};

/// Raw block allocator consumed by every buffer variant.
///
/// # Safety
///
/// Implementors must return blocks that are valid for reads and writes of at least the
/// requested size (or the reported usable size, for the probed calls) and aligned to
/// `layout.align()`. A block stays valid until it is passed to
/// [`reallocate`](RawAlloc::reallocate) or [`deallocate`](RawAlloc::deallocate).
/// Releasing a block with any size between the requested and the reported usable size
/// must be accepted.
pub unsafe trait RawAlloc {
    /// Allocates a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Allocates a block and reports how many bytes of it are usable.
    fn allocate_probed(&self, layout: Layout) -> Result<(NonNull<u8>, usize)> {
        self.allocate(layout).map(|ptr| (ptr, layout.size()))
    }

    /// Grows or shrinks a block, preserving its first `min(old, new)` bytes.
    ///
    /// # Safety
    ///
    /// `ptr` must have been produced by this allocator with `old`, and `new_size` must be
    /// non-zero. On success the old pointer must no longer be used.
    unsafe fn reallocate(&self, ptr: NonNull<u8>, old: Layout, new_size: usize)
    -> Result<NonNull<u8>>;

    /// Like [`reallocate`](RawAlloc::reallocate), also reporting the usable size.
    ///
    /// # Safety
    ///
    /// Same contract as [`reallocate`](RawAlloc::reallocate).
    unsafe fn reallocate_probed(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<(NonNull<u8>, usize)> {
        unsafe { self.reallocate(ptr, old, new_size) }.map(|ptr| (ptr, new_size))
    }

    /// Releases a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been produced by this allocator and `layout` must describe it.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The Rust global allocator. Usable size always equals the requested size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl RawAlloc for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        debug_assert!(layout.size() != 0);
        NonNull::new(unsafe { std::alloc::alloc(layout) })
            .ok_or(BufferError::AllocFailed { layout })
    }

    #[inline]
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        debug_assert!(new_size != 0);
        let new_layout = Layout::from_size_align(new_size, old.align())
            .map_err(|_| BufferError::CapacityOverflow)?;
        NonNull::new(unsafe { std::alloc::realloc(ptr.as_ptr(), old, new_size) })
            .ok_or(BufferError::AllocFailed { layout: new_layout })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// libc `malloc`/`realloc`/`free`, reporting `malloc_usable_size` where available.
#[cfg(feature = "malloc")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Malloc;

#[cfg(feature = "malloc")]
impl Malloc {
    const MIN_ALIGN: usize = core::mem::align_of::<libc::max_align_t>();

    fn usable_size(ptr: NonNull<u8>, requested: usize) -> usize {
        #[cfg(target_os = "linux")]
        {
            let usable = unsafe { libc::malloc_usable_size(ptr.as_ptr().cast()) };
            usable.max(requested)
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = ptr;
            requested
        }
    }
}

#[cfg(feature = "malloc")]
unsafe impl RawAlloc for Malloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        let raw = if layout.align() <= Self::MIN_ALIGN {
            unsafe { libc::malloc(layout.size()) }
        } else {
            let mut out = core::ptr::null_mut();
            match unsafe { libc::posix_memalign(&mut out, layout.align(), layout.size()) } {
                0 => out,
                _ => core::ptr::null_mut(),
            }
        };
        NonNull::new(raw.cast()).ok_or(BufferError::AllocFailed { layout })
    }

    fn allocate_probed(&self, layout: Layout) -> Result<(NonNull<u8>, usize)> {
        let ptr = self.allocate(layout)?;
        Ok((ptr, Self::usable_size(ptr, layout.size())))
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        let new_layout = Layout::from_size_align(new_size, old.align())
            .map_err(|_| BufferError::CapacityOverflow)?;
        if old.align() <= Self::MIN_ALIGN {
            let raw = unsafe { libc::realloc(ptr.as_ptr().cast(), new_size) };
            return NonNull::new(raw.cast()).ok_or(BufferError::AllocFailed { layout: new_layout });
        }
        // realloc does not keep over-aligned blocks aligned
        let fresh = self.allocate(new_layout)?;
        unsafe {
            core::ptr::copy_nonoverlapping(
                ptr.as_ptr(),
                fresh.as_ptr(),
                old.size().min(new_size),
            );
            self.deallocate(ptr, old);
        }
        Ok(fresh)
    }

    unsafe fn reallocate_probed(
        &self,
        ptr: NonNull<u8>,
        old: Layout,
        new_size: usize,
    ) -> Result<(NonNull<u8>, usize)> {
        let ptr = unsafe { self.reallocate(ptr, old, new_size) }?;
        Ok((ptr, Self::usable_size(ptr, new_size)))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) {
        unsafe { libc::free(ptr.as_ptr().cast()) }
    }
}

/// Layout of `capacity` contiguous `T` slots.
#[inline]
pub(crate) fn array_layout<T>(capacity: usize) -> Result<Layout> {
    Layout::array::<T>(capacity).map_err(|_| BufferError::CapacityOverflow)
}
