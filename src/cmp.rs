//! Comparison and hashing written purely against [`AnyBuffer`].
//!
//! Nothing here looks at storage layout, so any two buffers can be compared, including
//! two different variants or a buffer and a `Vec`. The operator traits (`==`, `<`, ...)
//! are implemented for every pair of buffer variants on top of these functions.

use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};

use fnv::FnvBuildHasher;

use crate::alloc::RawAlloc;
use crate::buffers::{HeaderBuffer, InlineBuffer, ProbedBuffer, SplitBuffer};
use crate::contract::AnyBuffer;
use crate::size::SizeType;

/// Element-wise equality. Buffers of different lengths are never equal; otherwise the
/// scan stops at the first mismatch.
pub fn equals<T, U, L, R>(lhs: &L, rhs: &R) -> bool
where
    T: PartialEq<U>,
    L: AnyBuffer<T> + ?Sized,
    R: AnyBuffer<U> + ?Sized,
{
    let (lhs, rhs) = (lhs.as_slice(), rhs.as_slice());
    if lhs.len() != rhs.len() {
        return false;
    }
    lhs.iter().zip(rhs).all(|(a, b)| a == b)
}

/// Lexicographic "comes before" under an element-level strict ordering `less`.
///
/// The first position where either element is `less` than the other decides; if one
/// sequence is a prefix of the other, the shorter one comes first.
///
/// The `<`, `<=`, `>` and `>=` operators do not route through this function; they use
/// [`lexicographic_partial_cmp`], so they always agree with `Ord` and `==`.
pub fn lexicographic_compare<T, L, R, F>(lhs: &L, rhs: &R, mut less: F) -> bool
where
    L: AnyBuffer<T> + ?Sized,
    R: AnyBuffer<T> + ?Sized,
    F: FnMut(&T, &T) -> bool,
{
    let (lhs, rhs) = (lhs.as_slice(), rhs.as_slice());
    for (a, b) in lhs.iter().zip(rhs) {
        if less(a, b) {
            return true;
        }
        if less(b, a) {
            return false;
        }
    }
    lhs.len() < rhs.len()
}

/// Lexicographic three-way comparison; `None` if some element pair is unordered.
pub fn lexicographic_partial_cmp<T, U, L, R>(lhs: &L, rhs: &R) -> Option<Ordering>
where
    T: PartialOrd<U>,
    L: AnyBuffer<T> + ?Sized,
    R: AnyBuffer<U> + ?Sized,
{
    let (lhs, rhs) = (lhs.as_slice(), rhs.as_slice());
    for (a, b) in lhs.iter().zip(rhs) {
        match a.partial_cmp(b) {
            Some(Ordering::Equal) => continue,
            decided => return decided,
        }
    }
    Some(lhs.len().cmp(&rhs.len()))
}

/// Order-sensitive hash with the crate's default (FNV) hasher.
///
/// Seeded from the hash of the length; for each element the running value is rotated
/// left by 11 bits and XORed with the element's hash. Equal sequences hash equally in
/// every variant; permutations generally do not.
pub fn order_sensitive_hash<T, B>(buffer: &B) -> u64
where
    T: Hash,
    B: AnyBuffer<T> + ?Sized,
{
    order_sensitive_hash_with(buffer, &FnvBuildHasher::default())
}

/// [`order_sensitive_hash`] with a caller-chosen hasher.
pub fn order_sensitive_hash_with<T, B, S>(buffer: &B, build: &S) -> u64
where
    T: Hash,
    B: AnyBuffer<T> + ?Sized,
    S: BuildHasher,
{
    let items = buffer.as_slice();
    items
        .iter()
        .fold(build.hash_one(items.len()), |acc, item| {
            acc.rotate_left(11) ^ build.hash_one(item)
        })
}

// --- Operator impls across variants ---

macro_rules! impl_cross_cmp {
    ([$($lg:tt)*] $lhs:ty, [$($rg:tt)*] $rhs:ty) => {
        impl<T, U, $($lg)*, $($rg)*> PartialEq<$rhs> for $lhs
        where
            T: PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &$rhs) -> bool {
                equals(self, other)
            }
        }

        impl<T, U, $($lg)*, $($rg)*> PartialOrd<$rhs> for $lhs
        where
            T: PartialOrd<U>,
        {
            #[inline]
            fn partial_cmp(&self, other: &$rhs) -> Option<Ordering> {
                lexicographic_partial_cmp(self, other)
            }
        }
    };
}

macro_rules! impl_cross_cmp_all {
    (lhs: [$($lg:tt $lhs:ty),* $(,)?] rhs: $rhs:tt) => {
        $(impl_cross_cmp_all!(@row $lg $lhs, $rhs);)*
    };
    (@row $lg:tt $lhs:ty, [$($rg:tt $rhs:ty),* $(,)?]) => {
        $(impl_cross_cmp_all!(@one $lg $lhs, $rg $rhs);)*
    };
    (@one [$($lg:tt)*] $lhs:ty, [$($rg:tt)*] $rhs:ty) => {
        impl_cross_cmp!([$($lg)*] $lhs, [$($rg)*] $rhs);
    };
}

impl_cross_cmp_all!(
    lhs: [
        [const K: usize, A: RawAlloc, S: SizeType] InlineBuffer<T, K, A, S>,
        [A: RawAlloc, S: SizeType] HeaderBuffer<T, A, S>,
        [A: RawAlloc, S: SizeType] SplitBuffer<T, A, S>,
        [A: RawAlloc, S: SizeType] ProbedBuffer<T, A, S>,
    ]
    rhs: [
        [const K2: usize, B: RawAlloc, S2: SizeType] InlineBuffer<U, K2, B, S2>,
        [B: RawAlloc, S2: SizeType] HeaderBuffer<U, B, S2>,
        [B: RawAlloc, S2: SizeType] SplitBuffer<U, B, S2>,
        [B: RawAlloc, S2: SizeType] ProbedBuffer<U, B, S2>,
    ]
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Buffer;
    use std::hash::{DefaultHasher, Hasher};

    fn hash_of<H: Hash>(value: &H) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equals_across_variants() {
        let inline: InlineBuffer<i32, 2> = InlineBuffer::from_slice(&[1, 2, 3]);
        let header: HeaderBuffer<i32> = HeaderBuffer::from_slice(&[1, 2, 3]);
        let split: SplitBuffer<i32> = SplitBuffer::from_slice(&[1, 2, 3]);
        let probed: ProbedBuffer<i32> = ProbedBuffer::from_slice(&[1, 2, 3]);

        assert!(inline == header);
        assert!(header == split);
        assert!(split == probed);
        assert!(probed == inline);
        assert!(equals(&inline, &vec![1, 2, 3]));
        assert!(equals(&split, &[1, 2, 3]));
    }

    #[test]
    fn test_different_lengths_never_equal() {
        let a: SplitBuffer<i32> = SplitBuffer::from_slice(&[1, 2]);
        let b: HeaderBuffer<i32> = HeaderBuffer::from_slice(&[1, 2, 0]);
        assert!(a != b);
        assert!(!equals(&a, &b));

        let empty: InlineBuffer<i32, 4> = InlineBuffer::new();
        let also_empty: ProbedBuffer<i32> = ProbedBuffer::new();
        assert!(empty == also_empty);
    }

    #[test]
    fn test_lexicographic_ordering() {
        let abc: SplitBuffer<char> = SplitBuffer::from_slice(&['a', 'b', 'c']);
        let abd: HeaderBuffer<char> = HeaderBuffer::from_slice(&['a', 'b', 'd']);
        let ab: InlineBuffer<char, 4> = InlineBuffer::from_slice(&['a', 'b']);

        assert!(abc < abd);
        assert!(abd > abc);
        assert!(ab < abc);
        assert!(ab <= abc);
        assert!(abc >= ab);
        assert!(!(abc < abc.clone()));
        assert_eq!(abc.partial_cmp(&abd), Some(Ordering::Less));
        assert_eq!(abc.cmp(&abc.clone()), Ordering::Equal);

        assert!(lexicographic_compare(&ab, &abc, |a, b| a < b));
        assert!(!lexicographic_compare(&abc, &ab, |a, b| a < b));
        // reversed order relation
        assert!(lexicographic_compare(&abd, &abc, |a, b| a > b));
    }

    #[test]
    fn test_partial_cmp_unordered_elements() {
        let a: SplitBuffer<f64> = SplitBuffer::from_slice(&[1.0, f64::NAN]);
        let b: ProbedBuffer<f64> = ProbedBuffer::from_slice(&[1.0, 2.0]);
        assert_eq!(a.partial_cmp(&b), None);
        assert!(a != b);

        let c: ProbedBuffer<f64> = ProbedBuffer::from_slice(&[0.5, f64::NAN]);
        assert_eq!(a.partial_cmp(&c), Some(Ordering::Greater));
    }

    #[test]
    fn test_hash_matches_across_variants() {
        let items = ["x".to_string(), "y".to_string(), "z".to_string()];
        let inline: InlineBuffer<String, 8> = InlineBuffer::from_slice(&items);
        let header: HeaderBuffer<String> = HeaderBuffer::from_slice(&items);
        let split: SplitBuffer<String> = SplitBuffer::from_slice(&items);
        let probed: ProbedBuffer<String> = ProbedBuffer::from_slice(&items);

        let expected = order_sensitive_hash(&items);
        assert_eq!(order_sensitive_hash(&inline), expected);
        assert_eq!(order_sensitive_hash(&header), expected);
        assert_eq!(order_sensitive_hash(&split), expected);
        assert_eq!(order_sensitive_hash(&probed), expected);

        assert_eq!(hash_of(&inline), hash_of(&split));
        assert_eq!(hash_of(&header), hash_of(&probed));
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let forward: SplitBuffer<u32> = (1..=5).collect();
        let backward: SplitBuffer<u32> = (1..=5).rev().collect();
        assert_ne!(order_sensitive_hash(&forward), order_sensitive_hash(&backward));

        let empty: SplitBuffer<u32> = SplitBuffer::new();
        let zero: SplitBuffer<u32> = SplitBuffer::from_slice(&[0]);
        assert_ne!(order_sensitive_hash(&empty), order_sensitive_hash(&zero));
    }

    #[test]
    fn test_hash_with_custom_builder() {
        let state = std::hash::RandomState::new();
        let a: HeaderBuffer<u8> = HeaderBuffer::from_slice(b"abc");
        let b: InlineBuffer<u8, 3> = InlineBuffer::from_slice(b"abc");
        assert_eq!(
            order_sensitive_hash_with(&a, &state),
            order_sensitive_hash_with(&b, &state)
        );
    }

    #[test]
    fn test_swap_exchanges_contents() {
        let a0: SplitBuffer<i32> = SplitBuffer::from_slice(&[1, 2, 3]);
        let b0: SplitBuffer<i32> = SplitBuffer::from_slice(&[7]);
        let (mut a, mut b) = (a0.clone(), b0.clone());
        crate::contract::swap(&mut a, &mut b);
        assert_eq!(a, b0);
        assert_eq!(b, a0);
    }

    #[test]
    fn test_every_variant_pair_compares() {
        let inline: InlineBuffer<u16, 2> = InlineBuffer::from_slice(&[1, 2, 3]);
        let header: HeaderBuffer<u16> = HeaderBuffer::from_slice(&[1, 2, 3]);
        let split: SplitBuffer<u16> = SplitBuffer::from_slice(&[1, 2, 3]);
        let probed: ProbedBuffer<u16> = ProbedBuffer::from_slice(&[1, 2, 3]);
        let longer: SplitBuffer<u16> = SplitBuffer::from_slice(&[1, 2, 3, 0]);

        macro_rules! check_row {
            ($lhs:expr) => {
                assert!($lhs == inline && $lhs == header && $lhs == split && $lhs == probed);
                assert!($lhs <= inline && $lhs >= header && !($lhs < split) && !($lhs > probed));
                assert!($lhs < longer && longer > $lhs);
            };
        }
        check_row!(inline);
        check_row!(header);
        check_row!(split);
        check_row!(probed);
    }

    #[test]
    fn test_compare_across_size_types() {
        let wide: SplitBuffer<u8> = SplitBuffer::from_slice(b"abc");
        let narrow: HeaderBuffer<u8, crate::alloc::Global, u8> = HeaderBuffer::from_slice(b"abc");
        let small: InlineBuffer<u8, 4, crate::alloc::Global, u16> =
            InlineBuffer::from_slice(b"abd");
        assert!(wide == narrow);
        assert!(narrow < small);
        assert_eq!(order_sensitive_hash(&wide), order_sensitive_hash(&narrow));
    }

    #[test]
    fn test_operators_ignore_custom_predicate() {
        let a: SplitBuffer<i32> = SplitBuffer::from_slice(&[1]);
        let b: InlineBuffer<i32, 2> = InlineBuffer::from_slice(&[1, 2]);
        // a prefix comes first under any predicate
        assert!(lexicographic_compare(&a, &b, |x, y| x > y));
        assert!(!(a > b) && !(a >= b));
        assert!(a < b && a <= b);
    }
}
