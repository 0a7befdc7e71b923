use crate::range::{CharIdx, CharLen};

/// Owned replacement text.
pub type Tendril = String;

/// Represents a single text change.
///
/// A change replaces the text range `[start, end)` with the optional
/// `replacement` text. If `replacement` is [`None`], this is a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// The starting character index of the change.
	pub start: CharIdx,
	/// The ending character index of the change (exclusive).
	pub end: CharIdx,
	/// The replacement text, or [`None`] for deletion.
	pub replacement: Option<Tendril>,
}

impl Change {
	/// Inserts `text` at `pos`.
	pub fn insert(pos: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start: pos,
			end: pos,
			replacement: Some(text.into()),
		}
	}

	/// Deletes `[start, end)`.
	pub fn delete(start: CharIdx, end: CharIdx) -> Self {
		Self {
			start,
			end,
			replacement: None,
		}
	}

	/// Replaces `[start, end)` with `text`.
	pub fn replace(start: CharIdx, end: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start,
			end,
			replacement: Some(text.into()),
		}
	}
}

/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through an insertion at that exact position, bias
/// decides whether the position stays before the inserted text or moves after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Favour the start of an insertion.
	Left,
	/// Favour the end of an insertion.
	Right,
}

/// One changed span, described in both old (`a`) and new (`b`) coordinates.
///
/// `[from_a, to_a)` in the old document became `[from_b, to_b)` in the new
/// document. `to_b - to_a` is the cumulative offset introduced by this change
/// and every change before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
	pub from_a: CharIdx,
	pub to_a: CharIdx,
	pub from_b: CharIdx,
	pub to_b: CharIdx,
}

impl ChangedRange {
	/// A changed range that leaves positions untouched but marks `[from, to)` dirty.
	pub fn in_place(from: CharIdx, to: CharIdx) -> Self {
		Self {
			from_a: from,
			to_a: to,
			from_b: from,
			to_b: to,
		}
	}

	pub(super) fn empty_at(a: CharIdx, b: CharIdx) -> Self {
		Self {
			from_a: a,
			to_a: a,
			from_b: b,
			to_b: b,
		}
	}

	/// Signed shift applied to positions at or after `to_a`.
	#[inline]
	pub fn shift(&self) -> isize {
		self.to_b as isize - self.to_a as isize
	}
}

/// A text insertion with cached character length.
///
/// Fields are private to enforce the invariant that `char_len` always equals
/// `text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	text: Tendril,
	char_len: CharLen,
}

impl Insertion {
	/// Creates a new insertion, computing the character length once.
	#[inline]
	pub fn new(text: Tendril) -> Self {
		let char_len = text.chars().count();
		Self { text, char_len }
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.char_len == 0
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> CharLen {
		self.char_len
	}

	/// Appends text from another insertion, updating the cached length.
	pub(super) fn push_str(&mut self, other: &Insertion) {
		self.text.push_str(&other.text);
		self.char_len += other.char_len;
	}
}

/// A single operation in a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	/// Retain the next N characters from the source document.
	Retain(CharLen),
	/// Delete the next N characters from the source document.
	Delete(CharLen),
	/// Insert new text at the current position.
	Insert(Insertion),
}
