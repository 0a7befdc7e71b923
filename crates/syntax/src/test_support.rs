//! Toy fragment and chunked parser shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lull_primitives::{Range, Rope};
use lull_worker::ManualClock;

use crate::error::ParseError;
use crate::fragment::{Fragment, FragmentSet};
use crate::parser::{Advance, ParseScope, Parser, PartialParse, StopBound};
use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestFragment {
	range: Range,
	parsed: bool,
	deferred: u32,
}

impl TestFragment {
	pub(crate) fn parsed(from: usize, to: usize) -> Self {
		Self {
			range: Range::new(from, to),
			parsed: true,
			deferred: 0,
		}
	}

	pub(crate) fn deferred(from: usize, to: usize, steps: u32) -> Self {
		Self {
			deferred: steps,
			..Self::parsed(from, to)
		}
	}
}

impl Fragment for TestFragment {
	fn range(&self) -> Range {
		self.range
	}

	fn is_parsed(&self) -> bool {
		self.parsed
	}

	fn advance(&mut self) -> bool {
		self.deferred = self.deferred.saturating_sub(1);
		self.deferred == 0
	}

	fn offset_copy(&self, offset: isize) -> Self {
		let shift = |pos: usize| pos.checked_add_signed(offset).expect("fragment shifted below zero");
		Self {
			range: Range::new(shift(self.range.from), shift(self.range.to)),
			..self.clone()
		}
	}

	fn placeholder(range: Range) -> Self {
		Self {
			range,
			parsed: false,
			deferred: 0,
		}
	}
}

pub(crate) fn set(spans: &[(usize, usize)]) -> FragmentSet<TestFragment> {
	spans.iter().map(|&(from, to)| TestFragment::parsed(from, to)).collect::<Vec<_>>().into()
}

pub(crate) fn ranges_of(fragments: &[TestFragment]) -> Vec<(usize, usize)> {
	fragments.iter().map(|f| (f.from(), f.to())).collect()
}

pub(crate) fn doc(len: usize) -> Rope {
	Rope::from("a".repeat(len))
}

/// Parses `chunk` characters per step. A run of parsed fragments starting
/// exactly at the current position is reused in one step, and fresh chunks
/// end early at the next reusable fragment.
#[derive(Debug, Clone)]
pub(crate) struct ChunkParser {
	chunk: usize,
	segment: Option<usize>,
	fail_at: Option<usize>,
	clock: Option<(ManualClock, Duration)>,
	steps: Arc<AtomicUsize>,
	reused: Arc<AtomicUsize>,
}

impl ChunkParser {
	pub(crate) fn new(chunk: usize) -> Self {
		Self {
			chunk,
			segment: None,
			fail_at: None,
			clock: None,
			steps: Arc::default(),
			reused: Arc::default(),
		}
	}

	/// Every step moves `clock` forward by `cost`.
	pub(crate) fn with_clock(mut self, clock: &ManualClock, cost: Duration) -> Self {
		self.clock = Some((clock.clone(), cost));
		self
	}

	/// Each parse stops on its own once it has parsed `len` characters that
	/// it could not reuse.
	pub(crate) fn with_segment(mut self, len: usize) -> Self {
		self.segment = Some(len);
		self
	}

	/// Steps fail once the parse reaches `pos`.
	pub(crate) fn failing_at(mut self, pos: usize) -> Self {
		self.fail_at = Some(pos);
		self
	}

	pub(crate) fn steps(&self) -> usize {
		self.steps.load(Ordering::SeqCst)
	}

	pub(crate) fn reused(&self) -> usize {
		self.reused.load(Ordering::SeqCst)
	}
}

impl Parser<TestFragment> for ChunkParser {
	fn create_parse(&self, _doc: &Rope, fragments: &FragmentSet<TestFragment>, ranges: &[Range]) -> Box<dyn PartialParse<TestFragment>> {
		let from = ranges[0].from;
		let to = ranges[ranges.len() - 1].to;
		Box::new(ChunkParse {
			cfg: self.clone(),
			reuse: Arc::clone(fragments),
			end: to,
			segment_end: None,
			pos: from,
			bound: StopBound::default(),
			out: Vec::new(),
		})
	}
}

struct ChunkParse {
	cfg: ChunkParser,
	reuse: FragmentSet<TestFragment>,
	end: usize,
	segment_end: Option<usize>,
	pos: usize,
	bound: StopBound,
	out: Vec<TestFragment>,
}

impl ChunkParse {
	fn target(&self) -> usize {
		let target = self.bound.limit(self.end);
		self.segment_end.map_or(target, |end| end.min(target))
	}
}

impl PartialParse<TestFragment> for ChunkParse {
	fn advance(&mut self, _scope: &mut ParseScope<'_>, _time_hint: Option<Duration>) -> Result<Advance<TestFragment>, ParseError> {
		self.cfg.steps.fetch_add(1, Ordering::SeqCst);
		if let Some((clock, cost)) = &self.cfg.clock {
			clock.advance(*cost);
		}

		let target = self.target();
		if self.pos >= target {
			return Ok(Advance::done(Tree::new(self.out.clone())));
		}
		if self.cfg.fail_at.is_some_and(|at| self.pos >= at) {
			return Err(ParseError::Parser(format!("cannot parse at {}", self.pos)));
		}

		let start = self.pos;
		let reuse = Arc::clone(&self.reuse);
		for frag in reuse.iter().skip_while(|f| f.from() < start) {
			if frag.from() != self.pos || !frag.is_parsed() || frag.to() > target {
				break;
			}
			let mut frag = frag.clone();
			while !frag.advance() {}
			self.cfg.reused.fetch_add(1, Ordering::SeqCst);
			self.pos = frag.to();
			self.out.push(frag);
		}
		if self.pos > start {
			return Ok(Advance::pending());
		}

		if self.segment_end.is_none()
			&& let Some(len) = self.cfg.segment
		{
			self.segment_end = Some(self.pos + len).filter(|&end| end < self.end);
		}
		let resync = reuse.iter().filter(|f| f.is_parsed()).map(Fragment::from).find(|&from| from > self.pos);
		let next = (self.pos + self.cfg.chunk).min(self.target()).min(resync.unwrap_or(usize::MAX));
		self.out.push(TestFragment::parsed(self.pos, next));
		self.pos = next;
		Ok(Advance::pending())
	}

	fn parsed_pos(&self) -> usize {
		self.pos
	}

	fn stop_at(&mut self, pos: usize) -> Result<(), ParseError> {
		self.bound.set(pos)
	}

	fn stopped_at(&self) -> Option<usize> {
		match (self.bound.get(), self.segment_end) {
			(Some(bound), Some(end)) => Some(bound.min(end)),
			(bound, end) => bound.or(end),
		}
	}

	fn fragments(&self) -> FragmentSet<TestFragment> {
		self.out.clone().into()
	}
}
