//! Parser capabilities consumed by the scheduler.
//!
//! A [`Parser`] starts resumable [`PartialParse`] processes. The scheduler
//! drives a parse one [`PartialParse::advance`] step at a time and hands it a
//! [`ParseScope`] for the context the step runs in, so side effects such as
//! skipped regions land on the right document version.

use std::fmt;
use std::time::Duration;

use lull_primitives::{Range, Rope};
use lull_worker::Trigger;

use crate::error::ParseError;
use crate::fragment::{Fragment, FragmentSet};
use crate::tree::Tree;

/// Result of one parse step.
#[derive(Debug, Clone)]
pub struct Advance<F> {
	/// The parse is waiting on a dependency and made no progress.
	pub blocked: bool,
	/// Set once the parse reached a stopping point.
	pub tree: Option<Tree<F>>,
}

impl<F> Advance<F> {
	pub fn pending() -> Self {
		Self { blocked: false, tree: None }
	}

	pub fn blocked() -> Self {
		Self { blocked: true, tree: None }
	}

	pub fn done(tree: Tree<F>) -> Self {
		Self {
			blocked: false,
			tree: Some(tree),
		}
	}
}

/// Side channel from a running parse back to the context driving it.
pub struct ParseScope<'a> {
	skipped: &'a mut Vec<Range>,
	schedule_on: &'a mut Option<Trigger>,
}

impl<'a> ParseScope<'a> {
	pub(crate) fn new(skipped: &'a mut Vec<Range>, schedule_on: &'a mut Option<Trigger>) -> Self {
		Self { skipped, schedule_on }
	}

	/// Marks `[from, to)` as deliberately left unparsed until it scrolls into
	/// view.
	pub fn skip_until_in_view(&mut self, from: usize, to: usize) {
		tracing::trace!(from, to, "parse.scope.skip");
		self.skipped.push(Range::new(from, to));
	}

	/// Requests another scheduling round once `trigger` settles. Combines
	/// with any trigger registered earlier.
	pub fn schedule_on(&mut self, trigger: Trigger) {
		*self.schedule_on = Some(match self.schedule_on.take() {
			Some(pending) => pending.merge(trigger),
			None => trigger,
		});
	}

	pub fn skipped(&self) -> &[Range] {
		self.skipped
	}
}

impl fmt::Debug for ParseScope<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ParseScope")
			.field("skipped", &self.skipped)
			.field("schedule_on", &self.schedule_on.is_some())
			.finish()
	}
}

/// Owned storage for parses run outside any context.
#[derive(Debug, Default)]
pub struct DetachedScope {
	skipped: Vec<Range>,
	schedule_on: Option<Trigger>,
}

impl DetachedScope {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn scope(&mut self) -> ParseScope<'_> {
		ParseScope::new(&mut self.skipped, &mut self.schedule_on)
	}

	pub fn skipped(&self) -> &[Range] {
		&self.skipped
	}

	pub fn take_schedule_on(&mut self) -> Option<Trigger> {
		self.schedule_on.take()
	}
}

/// Monotonic upper bound for a [`PartialParse`].
///
/// Once set, the bound may stay or move forward but never back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopBound(Option<usize>);

impl StopBound {
	pub fn get(&self) -> Option<usize> {
		self.0
	}

	pub fn set(&mut self, pos: usize) -> Result<(), ParseError> {
		match self.0 {
			Some(current) if pos < current => Err(ParseError::InvalidBound { requested: pos, current }),
			_ => {
				self.0 = Some(pos);
				Ok(())
			}
		}
	}

	/// The position a parse over `[.., end)` must stop at.
	pub fn limit(&self, end: usize) -> usize {
		self.0.map_or(end, |bound| bound.min(end))
	}
}

/// A resumable parse process.
///
/// Once `parsed_pos` has reached the bound reported by `stopped_at`, the next
/// `advance` must return a tree.
pub trait PartialParse<F: Fragment>: Send {
	/// Performs one step of work. `time_hint` is how long the caller is
	/// willing to wait, if it has a deadline.
	fn advance(&mut self, scope: &mut ParseScope<'_>, time_hint: Option<Duration>) -> Result<Advance<F>, ParseError>;

	/// High-water mark of the parse. Never decreases.
	fn parsed_pos(&self) -> usize;

	/// Forbids the parse from running past `pos`.
	///
	/// Returns [`ParseError::InvalidBound`] if `pos` is lower than a bound
	/// set earlier.
	fn stop_at(&mut self, pos: usize) -> Result<(), ParseError>;

	fn stopped_at(&self) -> Option<usize>;

	/// Output completed so far.
	fn fragments(&self) -> FragmentSet<F>;
}

/// Factory for [`PartialParse`] processes.
pub trait Parser<F: Fragment>: Send + Sync {
	/// Starts a parse over `ranges`, which are sorted, non-overlapping and
	/// never empty.
	fn create_parse(&self, doc: &Rope, fragments: &FragmentSet<F>, ranges: &[Range]) -> Box<dyn PartialParse<F>>;

	/// Starts a parse, reusing `fragments` where possible.
	///
	/// Without `ranges` the whole document is parsed. An empty range list
	/// parses nothing and yields a tree at 0.
	fn start_parse(&self, doc: &Rope, fragments: &FragmentSet<F>, ranges: Option<&[Range]>) -> Box<dyn PartialParse<F>> {
		match ranges {
			None => self.create_parse(doc, fragments, &[Range::new(0, doc.len_chars())]),
			Some([]) => self.create_parse(doc, fragments, &[Range::point(0)]),
			Some(ranges) => self.create_parse(doc, fragments, ranges),
		}
	}

	/// Runs a parse to completion outside any context.
	fn parse(&self, doc: &Rope, fragments: &FragmentSet<F>, ranges: Option<&[Range]>) -> Result<Tree<F>, ParseError> {
		let mut parse = self.start_parse(doc, fragments, ranges);
		let mut detached = DetachedScope::new();
		loop {
			if let Some(tree) = parse.advance(&mut detached.scope(), Some(Duration::from_millis(100)))?.tree {
				return Ok(tree);
			}
		}
	}
}
