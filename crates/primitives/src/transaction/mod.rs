//! Document change descriptions and position mapping.

mod changeset;
mod types;

pub use changeset::{ChangeSet, ChangedRanges};
pub use types::{Bias, Change, ChangedRange, Insertion, Operation, Tendril};

#[cfg(test)]
mod tests;
