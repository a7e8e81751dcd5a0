//! Errors reported by the fallible (`try_*`) buffer operations.

use core::alloc::Layout;

use thiserror::Error;

/// Failure of a checked buffer operation.
///
/// The panicking API (`push`, `reserve`, `erase`, indexing) treats the same conditions
/// as programming errors or aborts through [`std::alloc::handle_alloc_error`]; the `try_*`
/// twins surface them here instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The requested capacity does not fit in `isize::MAX` bytes or in the buffer's size type.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator could not satisfy the request.
    #[error("allocation of {} bytes (align {}) failed", .layout.size(), .layout.align())]
    AllocFailed { layout: Layout },

    /// A positional access named a slot that holds no live element.
    #[error("index (is {index}) should be < len (is {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The operation needs at least one element.
    #[error("buffer is empty")]
    Empty,
}

pub type Result<T, E = BufferError> = core::result::Result<T, E>;

impl BufferError {
    /// Turns an allocation-level error into the infallible API's failure mode.
    #[cold]
    #[track_caller]
    pub(crate) fn handle(self) -> ! {
        match self {
            BufferError::AllocFailed { layout } => std::alloc::handle_alloc_error(layout),
            other => panic!("{other}"),
        }
    }
}
