//! Integer types a buffer may store its length and capacity in.
//!
//! Every variant takes a size type parameter `S` defaulting to `usize`. A narrower `S`
//! shrinks the bookkeeping (two fields for the split layouts, the header for
//! [`HeaderBuffer`](crate::HeaderBuffer)) at the price of a lower ceiling: a buffer never
//! holds more than [`SizeType::MAX`] elements, and asking for more reports
//! [`BufferError::CapacityOverflow`](crate::BufferError::CapacityOverflow).
//!
//! The public API always speaks `usize`; conversion happens at the storage boundary.

use core::fmt;

use crate::error::{BufferError, Result};

mod sealed {
    pub trait Sealed {}
}

/// An unsigned integer usable as a buffer's length and capacity field.
///
/// Implemented for `u8`, `u16`, `u32` and `usize`. Sealed.
pub trait SizeType: Copy + Eq + Ord + Default + fmt::Debug + sealed::Sealed + 'static {
    /// Largest length or capacity representable, as a `usize`.
    const MAX: usize;

    const ZERO: Self;

    /// `n` as `Self`, or `None` if it does not fit.
    fn from_usize(n: usize) -> Option<Self>;

    /// `n` as `Self`, dropping high bits. Callers guarantee `n <= Self::MAX`.
    fn from_usize_truncating(n: usize) -> Self;

    fn to_usize(self) -> usize;
}

macro_rules! impl_size_type {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl SizeType for $t {
                const MAX: usize = if (<$t>::MAX as u128) < (usize::MAX as u128) {
                    <$t>::MAX as usize
                } else {
                    usize::MAX
                };

                const ZERO: Self = 0;

                #[inline(always)]
                fn from_usize(n: usize) -> Option<Self> {
                    <$t>::try_from(n).ok()
                }

                #[inline(always)]
                fn from_usize_truncating(n: usize) -> Self {
                    debug_assert!(n <= <Self as SizeType>::MAX);
                    n as $t
                }

                #[inline(always)]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_size_type!(u8, u16, u32, usize);

/// `n` as `S`, reporting a capacity overflow if it does not fit.
#[inline]
pub(crate) fn to_size<S: SizeType>(n: usize) -> Result<S> {
    S::from_usize(n).ok_or(BufferError::CapacityOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_type_limits() {
        assert_eq!(<u8 as SizeType>::MAX, 255);
        assert_eq!(<u16 as SizeType>::MAX, 65_535);
        assert_eq!(<usize as SizeType>::MAX, usize::MAX);
        assert!(<u32 as SizeType>::MAX >= u16::MAX as usize);
    }

    #[test]
    fn test_to_size_checks_range() {
        assert_eq!(to_size::<u8>(255), Ok(255u8));
        assert_eq!(to_size::<u8>(256), Err(BufferError::CapacityOverflow));
        assert_eq!(to_size::<u16>(70_000), Err(BufferError::CapacityOverflow));
        assert_eq!(to_size::<usize>(70_000), Ok(70_000usize));
        assert_eq!(300u16.to_usize(), 300);
    }
}
