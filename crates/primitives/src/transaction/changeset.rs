use super::types::{Bias, Change, ChangedRange, Insertion, Operation, Tendril};
use crate::Rope;
use crate::range::{CharIdx, CharLen};

/// A sequence of operations representing a set of changes to a document.
///
/// Changes are stored as retain, delete and insert operations covering the
/// whole source document. Inserts are kept in front of a delete at the same
/// position so a replacement always reads `Insert, Delete`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	/// Sequence of retain/delete/insert operations.
	pub(super) changes: Vec<Operation>,
	/// Length of the source document before changes.
	pub(super) len: usize,
	/// Length of the document after applying changes.
	pub(super) len_after: usize,
}

impl ChangeSet {
	/// Creates an identity changeset for a document of `len` characters.
	pub fn identity(len: CharLen) -> Self {
		let mut cs = Self::default();
		cs.retain(len);
		cs
	}

	/// Builds a changeset from sorted, non-overlapping changes against a
	/// document of `doc_len` characters.
	///
	/// # Panics
	///
	/// Panics if the changes are unsorted, overlap, or reach past `doc_len`.
	pub fn from_changes(doc_len: CharLen, changes: impl IntoIterator<Item = Change>) -> Self {
		let mut cs = Self::default();
		let mut last = 0;
		for change in changes {
			assert!(
				change.start >= last && change.start <= change.end && change.end <= doc_len,
				"change {}..{} is out of order or out of bounds (previous end {last}, doc len {doc_len})",
				change.start,
				change.end
			);
			cs.retain(change.start - last);
			if let Some(text) = change.replacement {
				cs.insert(text);
			}
			cs.delete(change.end - change.start);
			last = change.end;
		}
		cs.retain(doc_len - last);
		cs
	}

	/// Returns the length of the source document (before changes).
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns the length of the document after applying changes.
	pub fn len_after(&self) -> usize {
		self.len_after
	}

	/// Returns true if applying this changeset leaves the document untouched.
	pub fn is_empty(&self) -> bool {
		self.changes.iter().all(|op| matches!(op, Operation::Retain(_)))
	}

	/// Returns a slice of all operations in this changeset.
	pub fn changes(&self) -> &[Operation] {
		&self.changes
	}

	/// Adds a retain operation, preserving N characters from the source.
	pub fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;
		self.len_after += n;

		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	/// Adds a delete operation, removing N characters from the source.
	pub fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;

		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	/// Adds an insert operation at the current position.
	///
	/// An insert following a delete is moved in front of it so replacements
	/// keep a canonical order.
	pub fn insert(&mut self, text: Tendril) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		self.len_after += ins.char_len();

		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.push_str(&ins);
			}
			[.., last @ Operation::Delete(_)] => {
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document, modifying it in place.
	pub fn apply(&self, doc: &mut Rope) {
		debug_assert_eq!(doc.len_chars(), self.len, "changeset applied to a document of the wrong length");
		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					pos += n;
				}
				Operation::Delete(n) => {
					doc.remove(pos..pos + n);
				}
				Operation::Insert(ins) => {
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
	}

	/// Maps a position in the old document to the new document.
	///
	/// Positions inside a deleted span collapse onto the deletion point.
	/// `bias` only matters for positions exactly at an insertion.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut old_pos = 0;
		let mut new_pos = 0;

		for op in &self.changes {
			if old_pos > pos {
				break;
			}

			match op {
				Operation::Retain(n) => {
					if old_pos + n > pos {
						return new_pos + (pos - old_pos);
					}
					old_pos += n;
					new_pos += n;
				}
				Operation::Delete(n) => {
					if old_pos + n > pos {
						return new_pos;
					}
					old_pos += n;
				}
				Operation::Insert(ins) => {
					if !(old_pos == pos && bias == Bias::Left) {
						new_pos += ins.char_len();
					}
				}
			}
		}

		new_pos + (pos - old_pos)
	}

	/// Iterates the changed spans in document order.
	///
	/// Adjacent insert and delete operations are reported as one range.
	pub fn changed_ranges(&self) -> ChangedRanges<'_> {
		ChangedRanges {
			ops: self.changes.iter(),
			pos_a: 0,
			pos_b: 0,
		}
	}
}

/// Iterator returned by [`ChangeSet::changed_ranges`].
pub struct ChangedRanges<'a> {
	ops: std::slice::Iter<'a, Operation>,
	pos_a: CharIdx,
	pos_b: CharIdx,
}

impl Iterator for ChangedRanges<'_> {
	type Item = ChangedRange;

	fn next(&mut self) -> Option<ChangedRange> {
		let mut pending: Option<ChangedRange> = None;
		loop {
			let (a, b) = (self.pos_a, self.pos_b);
			match self.ops.next() {
				None => return pending,
				Some(Operation::Retain(n)) => {
					self.pos_a += n;
					self.pos_b += n;
					if pending.is_some() {
						return pending;
					}
				}
				Some(Operation::Delete(n)) => {
					self.pos_a += n;
					let range = pending.get_or_insert(ChangedRange::empty_at(a, b));
					range.to_a = self.pos_a;
				}
				Some(Operation::Insert(ins)) => {
					self.pos_b += ins.char_len();
					let range = pending.get_or_insert(ChangedRange::empty_at(a, b));
					range.to_b = self.pos_b;
				}
			}
		}
	}
}
