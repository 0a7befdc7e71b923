//! Reusable slices of earlier parse output.
//!
//! A fragment set is an `Arc<[F]>` sorted by `from` with no two fragments
//! overlapping. [`apply_changes`] carries a set across an edit, [`add_tree`]
//! splices a freshly produced tree in front of it.

use std::fmt;
use std::sync::Arc;

use lull_primitives::{ChangedRange, Range};

use crate::tree::Tree;

/// Shared, immutable fragment sequence.
pub type FragmentSet<F> = Arc<[F]>;

/// A reusable slice of parse output over `[from, to)`.
pub trait Fragment: Clone + fmt::Debug + Send + Sync + 'static {
	/// The span this fragment covers.
	fn range(&self) -> Range;

	#[inline]
	fn from(&self) -> usize {
		self.range().from
	}

	#[inline]
	fn to(&self) -> usize {
		self.range().to
	}

	/// False for placeholders standing in for skipped or deferred content.
	fn is_parsed(&self) -> bool;

	/// Drives lazily deferred content one step. Returns true once the
	/// fragment's content is fully realized.
	fn advance(&mut self) -> bool;

	/// Returns a structurally identical fragment moved by `offset`.
	fn offset_copy(&self, offset: isize) -> Self;

	/// Creates an unparsed placeholder spanning `range`.
	fn placeholder(range: Range) -> Self;
}

/// Carries `fragments` from the old document to the new one.
///
/// Fragments overlapping a changed range are dropped whole; the rest move by
/// the net length change of every edit before them. Touching a change at
/// either edge is not an overlap.
pub fn apply_changes<F: Fragment>(fragments: &FragmentSet<F>, changes: &[ChangedRange]) -> FragmentSet<F> {
	if changes.is_empty() {
		return Arc::clone(fragments);
	}
	assert_ordered(fragments, "apply_changes");
	assert!(
		changes.windows(2).all(|w| w[0].to_a <= w[1].from_a),
		"apply_changes: changes are not sorted and disjoint"
	);

	let mut out = Vec::with_capacity(fragments.len());
	let mut changes = changes.iter().peekable();
	let mut offset = 0isize;
	for frag in fragments.iter() {
		while let Some(change) = changes.next_if(|c| c.to_a <= frag.from()) {
			offset = change.shift();
		}
		match changes.peek() {
			Some(change) if frag.to() > change.from_a => {}
			_ => out.push(if offset == 0 { frag.clone() } else { frag.offset_copy(offset) }),
		}
	}
	out.into()
}

/// Merges a freshly produced tree with an existing fragment set.
///
/// The tree's fragments are taken in full, followed by every existing
/// fragment lying entirely at or after `tree.to()`.
pub fn add_tree<F: Fragment>(tree: &Tree<F>, fragments: &FragmentSet<F>) -> FragmentSet<F> {
	let tail = fragments.iter().filter(|f| f.from() >= tree.to());
	tree.fragments().iter().chain(tail).cloned().collect::<Vec<_>>().into()
}

/// Evicts every fragment overlapping `range` without moving the others.
pub fn cut<F: Fragment>(fragments: &FragmentSet<F>, range: Range) -> FragmentSet<F> {
	apply_changes(fragments, &[ChangedRange::in_place(range.from, range.to)])
}

/// Returns true when the set is sorted and pairwise non-overlapping.
pub fn is_ordered<F: Fragment>(fragments: &[F]) -> bool {
	fragments.windows(2).all(|w| w[0].to() <= w[1].from())
}

pub(crate) fn assert_ordered<F: Fragment>(fragments: &[F], site: &str) {
	assert!(is_ordered(fragments), "{site}: fragments are not sorted and disjoint: {fragments:?}");
}

#[cfg(test)]
mod tests {
	use lull_primitives::{Change, ChangeSet};
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;
	use crate::test_support::{TestFragment, ranges_of, set};

	fn changes(doc_len: usize, edits: impl IntoIterator<Item = Change>) -> Vec<ChangedRange> {
		ChangeSet::from_changes(doc_len, edits).changed_ranges().collect()
	}

	#[test]
	fn empty_changes_return_the_same_set() {
		let frags = set(&[(0, 100), (100, 200)]);
		let out = apply_changes(&frags, &[]);
		assert!(Arc::ptr_eq(&frags, &out));
	}

	#[test]
	fn insert_drops_overlapping_and_shifts_later() {
		let frags = set(&[(0, 200), (300, 400)]);
		let out = apply_changes(&frags, &changes(1000, [Change::insert(100, "abcde")]));
		assert_eq!(ranges_of(&out), vec![(305, 405)]);
	}

	#[test]
	fn fragments_touching_a_change_survive() {
		let frags = set(&[(0, 100), (100, 150), (150, 300)]);
		let out = apply_changes(&frags, &changes(300, [Change::delete(100, 150)]));
		assert_eq!(ranges_of(&out), vec![(0, 100), (100, 250)]);
	}

	#[test]
	fn insert_at_fragment_start_shifts_it() {
		let frags = set(&[(0, 50), (50, 100)]);
		let out = apply_changes(&frags, &changes(100, [Change::insert(50, "xy")]));
		assert_eq!(ranges_of(&out), vec![(0, 50), (52, 102)]);
	}

	#[test]
	fn shifts_accumulate_across_changes() {
		let frags = set(&[(0, 10), (20, 30), (40, 50), (60, 70)]);
		let edits = [Change::insert(15, "aaa"), Change::replace(42, 44, "b"), Change::delete(55, 58)];
		let out = apply_changes(&frags, &changes(100, edits));
		assert_eq!(ranges_of(&out), vec![(0, 10), (23, 33), (59, 69)]);
	}

	#[test]
	fn shifted_fragments_keep_deferred_work() {
		let frags: FragmentSet<TestFragment> = vec![TestFragment::deferred(0, 10, 2), TestFragment::deferred(20, 30, 1)].into();
		let out = apply_changes(&frags, &changes(40, [Change::insert(15, "xyz")]));
		assert_eq!(ranges_of(&out), vec![(0, 10), (23, 33)]);

		let mut first = out[0].clone();
		assert!(!first.advance());
		assert!(first.advance());
		let mut second = out[1].clone();
		assert!(second.advance());
	}

	#[test]
	fn cut_keeps_positions() {
		let frags = set(&[(0, 100), (100, 200), (200, 300)]);
		let out = cut(&frags, Range::new(120, 180));
		assert_eq!(ranges_of(&out), vec![(0, 100), (200, 300)]);
	}

	#[test]
	fn add_tree_keeps_tail_beyond_tree() {
		let old = set(&[(0, 100), (100, 200), (200, 300), (300, 400)]);
		let tree = Tree::new(vec![TestFragment::parsed(0, 120), TestFragment::parsed(120, 250)]);
		let out = add_tree(&tree, &old);
		assert_eq!(ranges_of(&out), vec![(0, 120), (120, 250), (300, 400)]);
	}

	#[test]
	fn add_empty_tree_keeps_everything() {
		let old = set(&[(0, 100), (150, 200)]);
		let out = add_tree(&Tree::empty(), &old);
		assert_eq!(ranges_of(&out), vec![(0, 100), (150, 200)]);
	}

	#[test]
	#[should_panic(expected = "not sorted and disjoint")]
	fn unordered_input_is_a_defect() {
		let frags = set(&[(0, 100), (50, 150)]);
		let _ = apply_changes(&frags, &changes(200, [Change::insert(180, "x")]));
	}

	fn arb_set() -> impl Strategy<Value = FragmentSet<TestFragment>> {
		prop::collection::vec((0usize..20, 1usize..30), 0..12).prop_map(|spans| {
			let mut pos = 0;
			let mut out = Vec::new();
			for (gap, len) in spans {
				pos += gap;
				out.push(TestFragment::parsed(pos, pos + len));
				pos += len;
			}
			out.into()
		})
	}

	proptest! {
		#[test]
		fn prop_reconciliation_preserves_order(
			frags in arb_set(),
			edits in prop::collection::vec((0usize..400, 0usize..20, 0usize..20), 0..5),
		) {
			let mut sorted = edits;
			sorted.sort_by_key(|e| e.0);
			let mut last = 0;
			let mut list = Vec::new();
			for (start, del, ins) in sorted {
				if start < last {
					continue;
				}
				let end = (start + del).min(400);
				list.push(Change::replace(start, end, "z".repeat(ins)));
				last = end;
			}
			let ranges = changes(400, list);
			let out = apply_changes(&frags, &ranges);
			prop_assert!(is_ordered(&out));

			for frag in out.iter() {
				prop_assert!(ranges.iter().all(|c| !(frag.from() < c.to_b && frag.to() > c.from_b) || c.from_b == c.to_b));
			}

			let tree = Tree::new(vec![TestFragment::parsed(0, 60)]);
			prop_assert!(is_ordered(&add_tree(&tree, &out)));
		}
	}
}
