//! Document primitives shared by the parse scheduler: ranges, changesets and
//! position mapping over a [`Rope`] document.

/// Text range types and character index aliases.
pub mod range;
/// Changesets describing edits between two document versions.
pub mod transaction;

pub use range::{CharIdx, CharLen, Range};
pub use ropey::{Rope, RopeSlice};
pub use transaction::{Bias, Change, ChangeSet, ChangedRange};
