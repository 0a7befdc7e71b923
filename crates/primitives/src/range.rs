/// A position in the document, measured in characters (not bytes).
pub type CharIdx = usize;

/// A length or count in the document, measured in characters (not bytes).
pub type CharLen = usize;

/// A half-open document span `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
	pub from: CharIdx,
	pub to: CharIdx,
}

impl Range {
	/// Creates a new range. `from` must not exceed `to`.
	#[inline]
	pub fn new(from: CharIdx, to: CharIdx) -> Self {
		debug_assert!(from <= to, "inverted range {from}..{to}");
		Self { from, to }
	}

	/// Creates a zero-width range at the given position.
	#[inline]
	pub fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the length of the range in characters.
	#[inline]
	pub fn len(&self) -> CharLen {
		self.to - self.from
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.from == self.to
	}

	/// Returns true if the position is within the range (exclusive of `to`).
	#[inline]
	pub fn contains(&self, pos: CharIdx) -> bool {
		pos >= self.from && pos < self.to
	}

	/// Returns true if the two ranges share at least one position.
	///
	/// Ranges that merely touch (`a.to == b.from`) do not intersect.
	#[inline]
	pub fn intersects(&self, other: &Range) -> bool {
		self.from < other.to && self.to > other.from
	}

	/// Clamps both ends to `[0, max]`.
	pub fn clamp(&self, max: CharIdx) -> Self {
		Self {
			from: self.from.min(max),
			to: self.to.min(max),
		}
	}
}

impl From<std::ops::Range<CharIdx>> for Range {
	fn from(r: std::ops::Range<CharIdx>) -> Self {
		Self::new(r.start, r.end)
	}
}
