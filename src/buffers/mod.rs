//! The four storage layouts.

mod block;

pub mod header;
pub mod inline;
pub mod probed;
pub mod split;

pub use header::HeaderBuffer;
pub use inline::InlineBuffer;
pub use probed::ProbedBuffer;
pub use split::SplitBuffer;
