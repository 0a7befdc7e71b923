//! Live parse state for one document version.
//!
//! A [`ParseContext`] owns the committed tree, the reusable fragment set and
//! at most one in-flight [`PartialParse`]. Edits never mutate a context in
//! place: [`ParseContext::changes`] finalizes the old one and builds its
//! successor.

use std::sync::Arc;
use std::time::Duration;

use lull_primitives::{Bias, ChangeSet, Range, Rope};
use lull_worker::{Clock, Trigger};

use crate::config::WorkConfig;
use crate::error::ParseError;
use crate::fragment::{self, Fragment, FragmentSet};
use crate::parser::{Advance, ParseScope, Parser, PartialParse};
use crate::tree::Tree;

mod skipping;

pub use skipping::SkippingParser;


pub struct ParseContext<F: Fragment> {
	parser: Arc<dyn Parser<F>>,
	doc: Rope,
	clock: Arc<dyn Clock>,
	config: WorkConfig,
	fragments: FragmentSet<F>,
	tree: Tree<F>,
	tree_len: usize,
	viewport: Range,
	skipped: Vec<Range>,
	schedule_on: Option<Trigger>,
	parse: Option<Box<dyn PartialParse<F>>>,
}

impl<F: Fragment> std::fmt::Debug for ParseContext<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ParseContext")
			.field("doc_len", &self.doc.len_chars())
			.field("tree_len", &self.tree_len)
			.field("fragments", &self.fragments.len())
			.field("viewport", &self.viewport)
			.field("skipped", &self.skipped)
			.field("parsing", &self.parse.is_some())
			.finish()
	}
}

impl<F: Fragment> ParseContext<F> {
	/// Creates the context for a freshly opened document and runs one bounded
	/// pass over the initial viewport.
	///
	/// The returned context always holds a committed tree, even when that
	/// pass ran out of time.
	pub fn init(parser: Arc<dyn Parser<F>>, doc: Rope, clock: Arc<dyn Clock>, config: WorkConfig) -> Result<Self, ParseError> {
		let vp_to = config.init_viewport.min(doc.len_chars());
		let mut cx = Self {
			parser,
			doc,
			clock,
			config,
			fragments: Arc::from(Vec::new()),
			tree: Tree::empty(),
			tree_len: 0,
			viewport: Range::new(0, vp_to),
			skipped: Vec::new(),
			schedule_on: None,
			parse: None,
		};
		if !cx.work(config.apply(), Some(vp_to))? {
			cx.take_tree()?;
		}
		tracing::debug!(doc_len = cx.doc_len(), tree_len = cx.tree_len, "parse.context.init");
		Ok(cx)
	}

	/// Moves to the next document version and re-drives a bounded pass.
	///
	/// When the old version was not fully parsed, the pass stops at the old
	/// coverage mapped forward or the viewport end, whichever is later.
	pub fn apply(&mut self, changes: &ChangeSet, doc: Rope) -> Result<Self, ParseError> {
		let old_len = self.doc_len();
		let mut next = self.changes(changes, doc)?;
		let upto = (self.tree_len != old_len).then(|| changes.map_pos(self.tree_len, Bias::Left).max(next.viewport.to));
		if !next.work(self.config.apply(), upto)? {
			next.take_tree()?;
		}
		Ok(next)
	}

	/// Parses for at most `time`, aiming for coverage up to `upto` (the whole
	/// document when `None`).
	///
	/// Returns true once the tree covers the whole document, or when the
	/// committed tree already covered the target on entry. A return of false
	/// after running out of time leaves the in-flight parse in place.
	pub fn work(&mut self, time: Duration, upto: Option<usize>) -> Result<bool, ParseError> {
		let doc_len = self.doc_len();
		let upto = upto.filter(|&pos| pos < doc_len);
		let target = upto.unwrap_or(doc_len);
		if !self.tree.is_empty() && self.is_done(target) {
			self.take_tree()?;
			return Ok(true);
		}

		// `None` when `time` overflows the clock: no deadline.
		let deadline = self.clock.now().checked_add(time);
		let mut parse = match self.parse.take() {
			Some(parse) => parse,
			None => self.start_parse(),
		};
		if let Some(upto) = upto
			&& parse.stopped_at().is_none_or(|bound| bound < upto)
		{
			parse.stop_at(upto)?;
		}
		tracing::trace!(doc_len, target, parsed_pos = parse.parsed_pos(), ?time, "parse.context.work.start");

		loop {
			if upto.is_some()
				&& parse.parsed_pos() >= target.max(self.tree_len)
				&& parse.stopped_at().is_some_and(|bound| bound > target)
			{
				// An earlier call bounded the parse further out; commit what it
				// has already passed.
				self.parse = Some(parse);
				self.take_tree()?;
				tracing::trace!(tree_len = self.tree_len, "parse.context.work.reached");
				return Ok(self.tree_len >= doc_len);
			}
			let hint = deadline.map(|deadline| deadline.saturating_duration_since(self.clock.now()));
			let step = self.step(parse.as_mut(), hint)?;
			if let Some(tree) = step.tree {
				self.tree_len = parse.stopped_at().map_or(doc_len, |bound| bound.min(doc_len));
				self.commit(tree);
				if self.tree_len >= target {
					tracing::trace!(tree_len = self.tree_len, "parse.context.work.reached");
					return Ok(self.tree_len >= doc_len);
				}
				parse = self.start_parse();
				if let Some(upto) = upto {
					parse.stop_at(upto)?;
				}
				tracing::trace!(tree_len = self.tree_len, "parse.context.work.respawn");
			} else if step.blocked {
				tracing::trace!(parsed_pos = parse.parsed_pos(), "parse.context.work.blocked");
			}

			if deadline.is_some_and(|deadline| self.clock.now() >= deadline) {
				tracing::trace!(parsed_pos = parse.parsed_pos(), tree_len = self.tree_len, "parse.context.work.deadline");
				self.parse = Some(parse);
				return Ok(false);
			}
		}
	}

	/// Commits the in-flight parse at its current position.
	///
	/// Does nothing when there is no parse, or when the parse has not yet
	/// caught up with the committed coverage.
	pub fn take_tree(&mut self) -> Result<(), ParseError> {
		let Some(mut parse) = self.parse.take() else {
			return Ok(());
		};
		let pos = parse.parsed_pos();
		if pos < self.tree_len {
			self.parse = Some(parse);
			return Ok(());
		}

		let tree = match parse.stopped_at() {
			Some(bound) if bound > pos => Tree::new(parse.fragments()),
			bound => {
				if bound.is_none() {
					parse.stop_at(pos)?;
				}
				let hint = Some(self.config.min_slice());
				loop {
					if let Some(tree) = self.step(parse.as_mut(), hint)?.tree {
						break tree;
					}
				}
			}
		};
		self.tree_len = pos;
		self.commit(tree);
		tracing::debug!(tree_len = pos, fragments = self.fragments.len(), "parse.context.take_tree");
		Ok(())
	}

	/// Builds the context for the document after `changes`.
	///
	/// The in-flight parse is committed first. A non-empty changeset drops
	/// overlapped fragments, clears the tree and maps the viewport outward and
	/// skipped regions inward. The pending trigger moves to the successor.
	pub fn changes(&mut self, changes: &ChangeSet, doc: Rope) -> Result<Self, ParseError> {
		debug_assert_eq!(changes.len(), self.doc_len(), "changeset does not match the context document");
		debug_assert_eq!(changes.len_after(), doc.len_chars(), "changeset does not produce the new document");
		self.take_tree()?;

		let mut next = Self {
			parser: Arc::clone(&self.parser),
			doc,
			clock: Arc::clone(&self.clock),
			config: self.config,
			fragments: Arc::clone(&self.fragments),
			tree: self.tree.clone(),
			tree_len: self.tree_len,
			viewport: self.viewport,
			skipped: self.skipped.clone(),
			schedule_on: self.schedule_on.take(),
			parse: None,
		};
		if changes.is_empty() {
			return Ok(next);
		}

		let ranges: Vec<_> = changes.changed_ranges().collect();
		next.fragments = fragment::apply_changes(&self.fragments, &ranges);
		next.tree = Tree::empty();
		next.tree_len = 0;
		next.viewport = Range::new(
			changes.map_pos(self.viewport.from, Bias::Left),
			changes.map_pos(self.viewport.to, Bias::Right),
		);
		next.skipped = self
			.skipped
			.iter()
			.filter_map(|r| {
				let from = changes.map_pos(r.from, Bias::Right);
				let to = changes.map_pos(r.to, Bias::Left);
				(from < to).then(|| Range::new(from, to))
			})
			.collect();
		tracing::debug!(
			changed = ranges.len(),
			kept = next.fragments.len(),
			dropped = self.fragments.len() - next.fragments.len(),
			"parse.context.changes"
		);
		Ok(next)
	}

	/// Replaces the viewport. Skipped regions now in view are evicted from the
	/// fragment set so they get parsed for real.
	///
	/// Returns true when the parse state was reset.
	pub fn update_viewport(&mut self, viewport: Range) -> Result<bool, ParseError> {
		if self.viewport == viewport {
			return Ok(false);
		}
		self.viewport = viewport;

		let before = self.skipped.len();
		let mut fragments = Arc::clone(&self.fragments);
		self.skipped.retain(|region| {
			if region.intersects(&viewport) {
				fragments = fragment::cut(&fragments, *region);
				false
			} else {
				true
			}
		});
		self.fragments = fragments;
		if self.skipped.len() == before {
			return Ok(false);
		}

		tracing::debug!(cleared = before - self.skipped.len(), ?viewport, "parse.context.viewport.reset");
		self.reset()?;
		Ok(true)
	}

	/// Commits and drops any in-flight parse.
	pub fn reset(&mut self) -> Result<(), ParseError> {
		if self.parse.is_some() {
			self.take_tree()?;
			self.parse = None;
		}
		Ok(())
	}

	/// Records `[from, to)` as deliberately unparsed until it comes into view.
	pub fn skip_until_in_view(&mut self, from: usize, to: usize) {
		self.scope().skip_until_in_view(from, to);
	}

	/// A placeholder parser that skips its input and marks it for reparsing.
	/// With `until`, another scheduling round follows once it settles.
	pub fn skipping_parser(until: Option<Trigger>) -> SkippingParser {
		SkippingParser::new(until)
	}

	/// True when the fragment set covers `[0, upto)` without gaps and the
	/// committed coverage reaches `upto`.
	///
	/// This is stricter than checking that the first fragment starts at 0 and
	/// the last one reaches `upto`: a hole anywhere inside `[0, upto)` counts
	/// as not done.
	pub fn is_done(&self, upto: usize) -> bool {
		let upto = upto.min(self.doc_len());
		if self.tree_len < upto {
			return false;
		}
		let mut covered = 0;
		for frag in self.fragments.iter() {
			if frag.from() > covered || covered >= upto {
				break;
			}
			covered = covered.max(frag.to());
		}
		covered >= upto
	}

	/// The side channel handed to parses running inside this context.
	pub fn scope(&mut self) -> ParseScope<'_> {
		ParseScope::new(&mut self.skipped, &mut self.schedule_on)
	}

	pub fn tree(&self) -> &Tree<F> {
		&self.tree
	}

	pub fn tree_len(&self) -> usize {
		self.tree_len
	}

	pub fn viewport(&self) -> Range {
		self.viewport
	}

	pub fn skipped(&self) -> &[Range] {
		&self.skipped
	}

	pub fn fragments(&self) -> &FragmentSet<F> {
		&self.fragments
	}

	pub fn doc(&self) -> &Rope {
		&self.doc
	}

	pub fn doc_len(&self) -> usize {
		self.doc.len_chars()
	}

	pub fn config(&self) -> &WorkConfig {
		&self.config
	}

	pub fn has_active_parse(&self) -> bool {
		self.parse.is_some()
	}

	pub fn schedule_on_pending(&self) -> bool {
		self.schedule_on.is_some()
	}

	/// Hands the pending reschedule trigger to the scheduler. Each trigger is
	/// picked up once.
	pub fn take_schedule_on(&mut self) -> Option<Trigger> {
		self.schedule_on.take()
	}

	fn start_parse(&self) -> Box<dyn PartialParse<F>> {
		self.parser.start_parse(&self.doc, &self.fragments, None)
	}

	fn step(&mut self, parse: &mut dyn PartialParse<F>, hint: Option<Duration>) -> Result<Advance<F>, ParseError> {
		let mut scope = ParseScope::new(&mut self.skipped, &mut self.schedule_on);
		parse.advance(&mut scope, hint)
	}

	fn commit(&mut self, tree: Tree<F>) {
		self.fragments = fragment::add_tree(&tree, &self.fragments);
		self.tree = tree;
	}
}
