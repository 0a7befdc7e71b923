use std::time::Duration;

use lull_primitives::{Range, Rope};
use lull_worker::Trigger;

use crate::error::ParseError;
use crate::fragment::{Fragment, FragmentSet};
use crate::parser::{Advance, ParseScope, Parser, PartialParse, StopBound};
use crate::tree::Tree;

/// Placeholder parser for regions whose grammar is not available yet.
///
/// Its parses do no work: the requested ranges are recorded as skipped on the
/// running context and a blank tree is returned. When built with a trigger,
/// the context is also asked to reschedule once the trigger settles.
#[derive(Debug, Clone, Default)]
pub struct SkippingParser {
	until: Option<Trigger>,
}

impl SkippingParser {
	pub fn new(until: Option<Trigger>) -> Self {
		Self { until }
	}
}

impl<F: Fragment> Parser<F> for SkippingParser {
	fn create_parse(&self, _doc: &Rope, _fragments: &FragmentSet<F>, ranges: &[Range]) -> Box<dyn PartialParse<F>> {
		Box::new(SkippingParse {
			span: Range::new(ranges[0].from, ranges[ranges.len() - 1].to),
			ranges: ranges.to_vec(),
			until: self.until.clone(),
			parsed_pos: ranges[0].from,
			bound: StopBound::default(),
			tree: None,
		})
	}
}

struct SkippingParse<F> {
	span: Range,
	ranges: Vec<Range>,
	until: Option<Trigger>,
	parsed_pos: usize,
	bound: StopBound,
	tree: Option<Tree<F>>,
}

impl<F: Fragment> PartialParse<F> for SkippingParse<F> {
	fn advance(&mut self, scope: &mut ParseScope<'_>, _time_hint: Option<Duration>) -> Result<Advance<F>, ParseError> {
		for range in &self.ranges {
			scope.skip_until_in_view(range.from, range.to);
		}
		if let Some(until) = self.until.take() {
			scope.schedule_on(until);
		}
		self.parsed_pos = self.span.to;
		let tree = Tree::blank(self.span);
		self.tree = Some(tree.clone());
		Ok(Advance::done(tree))
	}

	fn parsed_pos(&self) -> usize {
		self.parsed_pos
	}

	fn stop_at(&mut self, pos: usize) -> Result<(), ParseError> {
		self.bound.set(pos)
	}

	fn stopped_at(&self) -> Option<usize> {
		self.bound.get()
	}

	fn fragments(&self) -> FragmentSet<F> {
		match &self.tree {
			Some(tree) => tree.fragments().clone(),
			None => FragmentSet::from(Vec::new()),
		}
	}
}
