use std::sync::Arc;

use lull_primitives::Range;

use crate::fragment::{Fragment, FragmentSet};

/// Immutable ordered parse output over `[from, to)`.
///
/// Cloning is cheap; clones share the fragment allocation and compare equal
/// under [`Tree::same`].
#[derive(Debug, Clone)]
pub struct Tree<F> {
	fragments: FragmentSet<F>,
}

impl<F: Fragment> Tree<F> {
	/// Wraps an ordered, non-overlapping fragment sequence.
	pub fn new(fragments: impl Into<FragmentSet<F>>) -> Self {
		let fragments = fragments.into();
		crate::fragment::assert_ordered(&fragments, "Tree::new");
		Self { fragments }
	}

	/// The tree with no fragments, spanning `[0, 0)`.
	pub fn empty() -> Self {
		Self {
			fragments: Arc::from(Vec::new()),
		}
	}

	/// A tree holding a single unparsed placeholder over `range`.
	pub fn blank(range: Range) -> Self {
		Self {
			fragments: Arc::from(vec![F::placeholder(range)]),
		}
	}

	pub fn from(&self) -> usize {
		self.fragments.first().map_or(0, Fragment::from)
	}

	pub fn to(&self) -> usize {
		self.fragments.last().map_or(0, Fragment::to)
	}

	pub fn range(&self) -> Range {
		Range::new(self.from(), self.to())
	}

	pub fn fragments(&self) -> &FragmentSet<F> {
		&self.fragments
	}

	pub fn is_empty(&self) -> bool {
		self.fragments.is_empty()
	}

	/// True for a tree made only of placeholders.
	pub fn is_blank(&self) -> bool {
		!self.is_empty() && self.fragments.iter().all(|f| !f.is_parsed())
	}

	/// Identity comparison: true when both handles share one allocation.
	pub fn same(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.fragments, &other.fragments)
	}
}

impl<F: Fragment> Default for Tree<F> {
	fn default() -> Self {
		Self::empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::TestFragment;

	#[test]
	fn test_empty_tree_spans_nothing() {
		let tree = Tree::<TestFragment>::empty();
		assert!(tree.is_empty());
		assert!(!tree.is_blank());
		assert_eq!(tree.range(), Range::new(0, 0));
	}

	#[test]
	fn test_bounds_follow_fragments() {
		let tree = Tree::new(vec![TestFragment::parsed(10, 40), TestFragment::parsed(40, 90)]);
		assert_eq!((tree.from(), tree.to()), (10, 90));
		assert!(!tree.is_blank());
	}

	#[test]
	fn test_blank_tree_wraps_placeholder() {
		let tree = Tree::<TestFragment>::blank(Range::new(50, 150));
		assert!(tree.is_blank());
		assert_eq!(tree.range(), Range::new(50, 150));
		assert_eq!(tree.fragments().len(), 1);
	}

	#[test]
	fn test_same_is_identity() {
		let a = Tree::new(vec![TestFragment::parsed(0, 5)]);
		let b = Tree::new(vec![TestFragment::parsed(0, 5)]);
		assert!(a.same(&a.clone()));
		assert!(!a.same(&b));
	}
}
