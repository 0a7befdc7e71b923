//! Incremental, time-sliced background parsing.
//!
//! A [`ParseContext`] drives a resumable [`PartialParse`] in bounded slices,
//! reusing [`Fragment`]s of earlier trees across edits. A [`ParseSession`]
//! runs those slices during host idle time under a per-window budget and
//! publishes each finished [`Tree`].

/// Work budgets and heuristics.
pub mod config;
/// Live parse state for one document version.
pub mod context;
pub mod error;
/// Reusable tree pieces and their reconciliation across edits.
pub mod fragment;
/// Published parse state and language support bundles.
pub mod model;
/// The pluggable parser contract.
pub mod parser;
pub mod scheduler;
pub mod session;
mod tree;

#[cfg(test)]
mod test_support;

pub use config::WorkConfig;
pub use context::{ParseContext, SkippingParser};
pub use error::{ConfigError, ParseError};
pub use fragment::{Fragment, FragmentSet};
pub use model::{ModelState, ModelSupport};
pub use parser::{Advance, DetachedScope, ParseScope, Parser, PartialParse, StopBound};
pub use scheduler::{ParseWorker, WorkRound};
pub use session::{ParseSession, SessionOptions};
pub use tree::Tree;
