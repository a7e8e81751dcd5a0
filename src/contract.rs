//! The public contract shared by every buffer variant.
//!
//! [`AnyBuffer`] is the read-only view: anything that can expose its live elements as a
//! slice. It is implemented by the four buffer variants and by `Vec`, slices and arrays,
//! so the comparison and hashing helpers in [`cmp`](crate::cmp) work across all of them.
//!
//! [`Buffer`] is the growable contract. A variant supplies its storage primitives
//! (pointer, length bookkeeping, reallocation, shrinking and swapping) and inherits every
//! element-level operation from the provided methods, so `push`, `erase` or `resize`
//! behave identically whichever layout sits underneath.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;
use core::ptr;
use core::slice;

use crate::error::{BufferError, Result};
use crate::growth::grow_target;
use crate::primitives::{
    construct_at, construct_with, copy_bitwise_range, copy_construct_range, destroy_range,
    relocate_in_place,
};

// --- AnyBuffer ---

/// A trait generalizing any contiguous collection of live elements.
pub trait AnyBuffer<T> {
    fn as_slice(&self) -> &[T];

    /// Reserved slots; equal to `len()` for fixed-size views.
    fn capacity(&self) -> usize {
        self.as_slice().len()
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn contains(&self, x: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().contains(x)
    }

    fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<T> AnyBuffer<T> for Vec<T> {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

impl<T> AnyBuffer<T> for [T] {
    fn as_slice(&self) -> &[T] {
        self
    }
}

impl<T, const N: usize> AnyBuffer<T> for [T; N] {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }
}

// --- Buffer ---

/// Growable, owning, contiguous storage for `T`.
///
/// Slots `[0, len)` are live and `[len, capacity)` are raw. `capacity() >= len()` holds
/// after every operation.
///
/// Preconditions on positions (`erase`, `remove`, `set`) panic when violated. The
/// `try_*` methods report the same conditions, and allocation failure, as
/// [`BufferError`] instead.
pub trait Buffer<T>: AnyBuffer<T> + Sized {
    /// Largest capacity the variant's size type can record.
    const MAX_CAPACITY: usize = usize::MAX;

    /// Pointer to the first slot. Never null; dangling while nothing is allocated.
    fn as_ptr(&self) -> *const T;

    /// Mutable pointer to the first slot. Never null; dangling while nothing is allocated.
    fn as_mut_ptr(&mut self) -> *mut T;

    /// Sets the number of live elements without touching any slot.
    ///
    /// # Safety
    ///
    /// `len <= capacity()`, and slots `[0, len)` must hold live values afterwards.
    unsafe fn set_len(&mut self, len: usize);

    /// Reallocates so that `capacity() >= capacity`, keeping all live elements.
    ///
    /// Called only with `self.capacity() < capacity <= Self::MAX_CAPACITY`. The variant
    /// decides the exact resulting capacity, which is never smaller than requested.
    fn try_grow_to(&mut self, capacity: usize) -> Result<()>;

    /// Releases unused capacity.
    fn shrink_to_fit(&mut self);

    /// Exchanges the entire contents of two buffers.
    fn swap_with(&mut self, other: &mut Self);

    // --- Construction ---

    /// An empty buffer with room for at least `capacity` elements.
    fn with_capacity(capacity: usize) -> Self
    where
        Self: Default,
    {
        let mut buffer = Self::default();
        buffer.reserve(capacity);
        buffer
    }

    /// `count` default-constructed elements.
    fn with_len(count: usize) -> Self
    where
        Self: Default,
        T: Default,
    {
        let mut buffer = Self::default();
        buffer.resize_with(count, T::default);
        buffer
    }

    /// `count` clones of `value`.
    fn from_elem(count: usize, value: T) -> Self
    where
        Self: Default,
        T: Clone,
    {
        let mut buffer = Self::default();
        buffer.resize(count, value);
        buffer
    }

    /// Clones of every element of `items`, with capacity exactly `items.len()`.
    fn from_slice(items: &[T]) -> Self
    where
        Self: Default,
        T: Clone,
    {
        let mut buffer = Self::default();
        buffer.reserve(items.len());
        buffer.extend_from_slice(items);
        buffer
    }

    /// Bitwise copy of `items`, with capacity exactly `items.len()`.
    fn from_copy_slice(items: &[T]) -> Self
    where
        Self: Default,
        T: Copy,
    {
        let mut buffer = Self::default();
        buffer.reserve(items.len());
        buffer.extend_from_copy_slice(items);
        buffer
    }

    /// Moves the contents out, leaving `self` empty in its unallocated state.
    fn take(&mut self) -> Self
    where
        Self: Default,
    {
        mem::take(self)
    }

    /// Deep copy sized to the live elements.
    fn clone_buffer(&self) -> Self
    where
        Self: Default,
        T: Clone,
    {
        Self::from_slice(self.as_slice())
    }

    /// Replaces the contents with clones of `source`, reusing the existing storage.
    fn clone_from_buffer<B: AnyBuffer<T> + ?Sized>(&mut self, source: &B)
    where
        T: Clone,
    {
        self.clear();
        self.extend_from_slice(source.as_slice());
    }

    // --- Capacity ---

    /// Ensures `capacity() >= capacity`. Never shrinks.
    fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.capacity() {
            if capacity > Self::MAX_CAPACITY {
                return Err(BufferError::CapacityOverflow);
            }
            self.try_grow_to(capacity)?;
        }
        Ok(())
    }

    /// Ensures `capacity() >= capacity`. Never shrinks.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow; aborts through `handle_alloc_error` if the allocator
    /// fails.
    fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            err.handle();
        }
    }

    /// Makes room for `additional` more elements using the shared growth policy.
    fn try_reserve_additional(&mut self, additional: usize) -> Result<()> {
        let target = grow_target(self.len(), self.capacity(), additional, Self::MAX_CAPACITY)
            .ok_or(BufferError::CapacityOverflow)?;
        self.try_reserve(target)
    }

    // --- Element access ---

    fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    fn try_front(&self) -> Result<&T> {
        self.as_slice().first().ok_or(BufferError::Empty)
    }

    fn try_back(&self) -> Result<&T> {
        self.as_slice().last().ok_or(BufferError::Empty)
    }

    /// The element at `index`, or `otherwise` past the end.
    fn get_or<'a>(&'a self, index: usize, otherwise: &'a T) -> &'a T {
        self.as_slice().get(index).unwrap_or(otherwise)
    }

    /// Overwrites the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn set(&mut self, index: usize, value: T) {
        let len = self.len();
        assert!(
            index < len,
            "set index (is {}) should be < len (is {})",
            index,
            len
        );
        self.as_mut_slice()[index] = value;
    }

    /// Overwrites the element at `index`, first growing with clones of `default` when
    /// `index` is past the end.
    fn set_extend(&mut self, index: usize, value: T, default: T)
    where
        T: Clone,
    {
        if index >= self.len() {
            match index.checked_add(1) {
                Some(len) => self.resize(len, default),
                None => BufferError::CapacityOverflow.handle(),
            }
        }
        self.as_mut_slice()[index] = value;
    }

    // --- Appending ---

    /// Constructs an element at the back from `make`, growing if needed.
    fn try_emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> Result<&mut T> {
        let len = self.len();
        if len == self.capacity() {
            self.try_reserve_additional(1)?;
        }
        unsafe {
            let slot = self.as_mut_ptr().add(len);
            construct_at(slot, make());
            self.set_len(len + 1);
            Ok(&mut *slot)
        }
    }

    fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        match self.try_emplace_back(make) {
            Ok(slot) => slot,
            Err(err) => err.handle(),
        }
    }

    /// Appends `value`. On failure `value` is dropped.
    fn try_push(&mut self, value: T) -> Result<()> {
        self.try_emplace_back(|| value).map(|_| ())
    }

    #[inline]
    fn push(&mut self, value: T) {
        self.emplace_back(|| value);
    }

    /// Appends clones of `items`.
    fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        if let Err(err) = self.try_reserve_additional(items.len()) {
            err.handle();
        }
        let len = self.len();
        unsafe {
            copy_construct_range(self.as_mut_ptr().add(len), items);
            self.set_len(len + items.len());
        }
    }

    /// Appends a bitwise copy of `items`.
    fn extend_from_copy_slice(&mut self, items: &[T])
    where
        T: Copy,
    {
        if let Err(err) = self.try_reserve_additional(items.len()) {
            err.handle();
        }
        let len = self.len();
        unsafe {
            copy_bitwise_range(self.as_mut_ptr().add(len), items);
            self.set_len(len + items.len());
        }
    }

    /// Appends clones of every element of another buffer, of any variant.
    fn append_buffer<B: AnyBuffer<T> + ?Sized>(&mut self, source: &B)
    where
        T: Clone,
    {
        self.extend_from_slice(source.as_slice());
    }

    // --- Removal ---

    fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        unsafe {
            self.set_len(len - 1);
            Some(ptr::read(self.as_ptr().add(len - 1)))
        }
    }

    fn try_pop(&mut self) -> Result<T> {
        self.pop().ok_or(BufferError::Empty)
    }

    /// Removes and returns the element at `index`, shifting the tail down by one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(
            index < len,
            "erase index (is {}) should be < len (is {})",
            index,
            len
        );
        unsafe {
            let base = self.as_mut_ptr();
            let removed = ptr::read(base.add(index));
            relocate_in_place(base.add(index), base.add(index + 1), len - index - 1);
            self.set_len(len - 1);
            removed
        }
    }

    /// Destroys the element at `index` and closes the gap. Returns the position of the
    /// element that followed it, which is now `index` (or `len()` when the last element
    /// was erased).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    fn try_erase(&mut self, index: usize) -> Result<usize> {
        let len = self.len();
        if index >= len {
            return Err(BufferError::IndexOutOfBounds { index, len });
        }
        Ok(self.erase(index))
    }

    /// Erases the first element equal to `value`, returning where it was.
    fn erase_value(&mut self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let index = self.as_slice().iter().position(|item| item == value)?;
        Some(self.erase(index))
    }

    /// Destroys every element past `len`.
    fn truncate(&mut self, len: usize) {
        let old_len = self.len();
        if len >= old_len {
            return;
        }
        unsafe {
            self.set_len(len);
            destroy_range(self.as_mut_ptr().add(len), old_len - len);
        }
    }

    /// Destroys every element; storage is kept.
    fn clear(&mut self) {
        self.truncate(0);
    }

    /// Same as [`clear`](Buffer::clear).
    fn reset(&mut self) {
        self.clear();
    }

    /// Destroys every element and releases the storage.
    fn finalize(&mut self) {
        self.clear();
        self.shrink_to_fit();
    }

    // --- Resizing ---

    /// Truncates, or grows with clones of `value`. Growing reserves exactly `len`.
    fn resize(&mut self, len: usize, value: T)
    where
        T: Clone,
    {
        let old_len = self.len();
        if len <= old_len {
            self.truncate(len);
            return;
        }
        self.reserve(len);
        unsafe {
            let tail = self.as_mut_ptr().add(old_len);
            construct_with(tail, len - old_len - 1, || value.clone());
            construct_at(tail.add(len - old_len - 1), value);
            self.set_len(len);
        }
    }

    /// Truncates, or grows with values produced by `make`. Growing reserves exactly `len`.
    fn resize_with<F: FnMut() -> T>(&mut self, len: usize, make: F) {
        let old_len = self.len();
        if len <= old_len {
            self.truncate(len);
            return;
        }
        self.reserve(len);
        unsafe {
            construct_with(self.as_mut_ptr().add(old_len), len - old_len, make);
            self.set_len(len);
        }
    }

    /// Truncates, or grows with default-constructed elements.
    fn resize_default(&mut self, len: usize)
    where
        T: Default,
    {
        self.resize_with(len, T::default);
    }
}

/// Exchanges the contents of two buffers of the same variant.
pub fn swap<T, B: Buffer<T>>(a: &mut B, b: &mut B) {
    a.swap_with(b);
}

// --- IntoIter ---

/// Owning iterator over the elements of any [`Buffer`].
///
/// The buffer's length is zeroed up front; the iterator tracks the live window itself and
/// destroys whatever was not yielded when dropped. The storage is released by the buffer's
/// own `Drop` afterwards.
pub struct IntoIter<T, B: Buffer<T>> {
    buffer: B,
    start: usize,
    end: usize,
    _marker: PhantomData<T>,
}

impl<T, B: Buffer<T>> IntoIter<T, B> {
    pub(crate) fn new(mut buffer: B) -> Self {
        let end = buffer.len();
        unsafe { buffer.set_len(0) };
        Self {
            buffer,
            start: 0,
            end,
            _marker: PhantomData,
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        unsafe {
            slice::from_raw_parts(self.buffer.as_ptr().add(self.start), self.end - self.start)
        }
    }
}

impl<T, B: Buffer<T>> Iterator for IntoIter<T, B> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let item = unsafe { ptr::read(self.buffer.as_ptr().add(self.start)) };
        self.start += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.start;
        (remaining, Some(remaining))
    }
}

impl<T, B: Buffer<T>> DoubleEndedIterator for IntoIter<T, B> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        Some(unsafe { ptr::read(self.buffer.as_ptr().add(self.end)) })
    }
}

impl<T, B: Buffer<T>> ExactSizeIterator for IntoIter<T, B> {}

impl<T, B: Buffer<T>> FusedIterator for IntoIter<T, B> {}

impl<T: fmt::Debug, B: Buffer<T>> fmt::Debug for IntoIter<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, B: Buffer<T>> Drop for IntoIter<T, B> {
    fn drop(&mut self) {
        let remaining = self.end - self.start;
        unsafe { destroy_range(self.buffer.as_mut_ptr().add(self.start), remaining) };
    }
}

// --- Shared trait impls ---

/// Implements the std traits every variant shares on top of [`Buffer`].
macro_rules! impl_buffer_common {
    ([$($g:tt)*] $ty:ty) => {
        impl<$($g)*> core::ops::Deref for $ty {
            type Target = [T];

            #[inline]
            fn deref(&self) -> &[T] {
                $crate::contract::AnyBuffer::as_slice(self)
            }
        }

        impl<$($g)*> core::ops::DerefMut for $ty {
            #[inline]
            fn deref_mut(&mut self) -> &mut [T] {
                $crate::contract::Buffer::as_mut_slice(self)
            }
        }

        impl<$($g)*> AsRef<[T]> for $ty {
            fn as_ref(&self) -> &[T] {
                self
            }
        }

        impl<$($g)*> AsMut<[T]> for $ty {
            fn as_mut(&mut self) -> &mut [T] {
                self
            }
        }

        impl<$($g)*> core::fmt::Debug for $ty
        where
            T: core::fmt::Debug,
        {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list().entries(self.iter()).finish()
            }
        }

        impl<$($g)*> core::hash::Hash for $ty
        where
            T: core::hash::Hash,
        {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                state.write_u64($crate::cmp::order_sensitive_hash(self));
            }
        }

        impl<$($g)*> Clone for $ty
        where
            T: Clone,
            $ty: Default,
        {
            fn clone(&self) -> Self {
                $crate::contract::Buffer::clone_buffer(self)
            }

            fn clone_from(&mut self, source: &Self) {
                $crate::contract::Buffer::clone_from_buffer(self, source);
            }
        }

        impl<$($g)*> Eq for $ty where T: Eq {}

        impl<$($g)*> Ord for $ty
        where
            T: Ord,
        {
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                self[..].cmp(&other[..])
            }
        }

        impl<$($g)*> Extend<T> for $ty {
            fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
                let iter = iter.into_iter();
                let (lower, _) = iter.size_hint();
                if let Err(err) = $crate::contract::Buffer::try_reserve_additional(self, lower) {
                    err.handle();
                }
                for item in iter {
                    $crate::contract::Buffer::push(self, item);
                }
            }
        }

        impl<'a, $($g)*> Extend<&'a T> for $ty
        where
            T: Copy + 'a,
        {
            fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
                self.extend(iter.into_iter().copied());
            }
        }

        impl<$($g)*> FromIterator<T> for $ty
        where
            $ty: Default,
        {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                let mut buffer = Self::default();
                buffer.extend(iter);
                buffer
            }
        }

        impl<$($g)*> IntoIterator for $ty {
            type Item = T;
            type IntoIter = $crate::contract::IntoIter<T, Self>;

            fn into_iter(self) -> Self::IntoIter {
                $crate::contract::IntoIter::new(self)
            }
        }

        impl<'a, $($g)*> IntoIterator for &'a $ty {
            type Item = &'a T;
            type IntoIter = core::slice::Iter<'a, T>;

            fn into_iter(self) -> Self::IntoIter {
                self[..].iter()
            }
        }

        impl<'a, $($g)*> IntoIterator for &'a mut $ty {
            type Item = &'a mut T;
            type IntoIter = core::slice::IterMut<'a, T>;

            fn into_iter(self) -> Self::IntoIter {
                self[..].iter_mut()
            }
        }
    };
}

pub(crate) use impl_buffer_common;
