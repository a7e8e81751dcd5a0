//! # Split Buffers
//!
//! Growable, contiguous buffers with four interchangeable storage layouts. All of them
//! expose the same [`Buffer`] contract, grow by the same policy, and compare and hash
//! identically, so choosing one is purely a question of footprint and allocation pattern.
//!
//! ## Layouts
//!
//! * [`InlineBuffer<T, K>`](InlineBuffer): embeds `K` slots in the value itself and only
//!   allocates once they overflow. `shrink_to_fit` moves the elements back when they fit.
//! * [`HeaderBuffer<T>`](HeaderBuffer): one pointer wide; length and capacity live in a
//!   header at the front of the heap block.
//! * [`SplitBuffer<T>`](SplitBuffer): pointer, length and capacity as plain fields.
//! * [`ProbedBuffer<T>`](ProbedBuffer): like `SplitBuffer`, but adopts the allocator's usable
//!   size as capacity, so size-class rounding becomes extra room instead of waste.
//!
//! ## Growth
//!
//! A full buffer grows to [`next_capacity`]: 2 slots first, then roughly 1.5x. Explicit
//! sizing (`reserve`, `resize`, `from_slice`) allocates exactly what was asked for.
//!
//! ## Allocators
//!
//! Every variant takes an allocator type parameter implementing [`RawAlloc`], defaulting
//! to [`Global`]. The `malloc` feature adds a libc-backed `Malloc` that reports
//! `malloc_usable_size`.
//!
//! ## Size types
//!
//! Length and capacity are stored as a [`SizeType`] (`u8`, `u16`, `u32` or `usize`, the
//! default), given as the last type parameter. A narrow size type shrinks the bookkeeping
//! and caps the capacity: growth stops at `S::MAX`, and going past it is a
//! [`BufferError::CapacityOverflow`].
//!
//! ```rust
//! use split_buffers::{BufferError, Global, prelude::*};
//!
//! let mut tiny: SplitBuffer<u8, Global, u8> = SplitBuffer::new_in(Global);
//! tiny.resize(255, 0);
//! assert_eq!(tiny.try_push(1), Err(BufferError::CapacityOverflow));
//! ```
//!
//! ## Examples
//!
//! ```rust
//! use split_buffers::prelude::*;
//!
//! // 4 inline slots. No allocation yet.
//! let mut small: InlineBuffer<i32, 4> = InlineBuffer::new();
//! small.extend([1, 2, 3, 4]);
//! assert!(small.is_inline());
//!
//! // 5th element promotes to the heap
//! small.push(5);
//! assert!(!small.is_inline());
//!
//! // Different layouts, same contents: equal, and hashed alike.
//! let split: SplitBuffer<i32> = SplitBuffer::from_slice(&[1, 2, 3, 4, 5]);
//! assert!(small == split);
//! assert_eq!(order_sensitive_hash(&small), order_sensitive_hash(&split));
//! ```
//!
//! ```rust
//! use split_buffers::prelude::*;
//!
//! let mut buf: HeaderBuffer<String> = HeaderBuffer::new();
//! assert!(buf.try_pop().is_err());
//!
//! buf.push("a".to_string());
//! buf.push("c".to_string());
//! let next = buf.erase(0);
//! assert_eq!(next, 0);
//! assert_eq!(buf[0], "c");
//! ```

// --- Module Declarations ---

pub mod alloc;
pub mod buffers;
pub mod cmp;
pub mod contract;
pub mod error;
pub mod growth;
pub mod primitives;
pub mod size;

// --- Re-exports ---

#[cfg(feature = "malloc")]
pub use alloc::Malloc;
pub use alloc::{Global, RawAlloc};
pub use buffers::{HeaderBuffer, InlineBuffer, ProbedBuffer, SplitBuffer};
pub use cmp::{
    equals, lexicographic_compare, lexicographic_partial_cmp, order_sensitive_hash,
    order_sensitive_hash_with,
};
pub use contract::{AnyBuffer, Buffer, IntoIter, swap};
pub use error::{BufferError, Result};
pub use growth::next_capacity;
pub use size::SizeType;

/// Everything needed to use the buffers: the variants, the contract traits and `SizeType`.
pub mod prelude {
    pub use crate::buffers::{HeaderBuffer, InlineBuffer, ProbedBuffer, SplitBuffer};
    pub use crate::cmp::{equals, lexicographic_compare, order_sensitive_hash};
    pub use crate::contract::{AnyBuffer, Buffer};
    pub use crate::size::SizeType;
}
