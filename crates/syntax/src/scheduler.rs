//! Chunked rate limiting for background parse slices.
//!
//! [`ParseWorker`] decides how much work a single idle callback may do and
//! what should happen afterwards. It holds no handles and performs no
//! scheduling itself; the session layer acts on the returned [`WorkRound`].

use std::time::{Duration, Instant};

use lull_worker::Clock;

use crate::config::WorkConfig;
use crate::context::ParseContext;
use crate::error::ParseError;
use crate::fragment::Fragment;

/// Outcome of one scheduled work invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkRound {
	/// The context reached its target, or the document end.
	pub done: bool,
	/// The context was finalized and its tree should be published.
	pub publish: bool,
	/// Another round should be requested.
	pub reschedule: bool,
	/// Time granted to the context, or `None` when the chunk budget was
	/// already spent.
	pub slice: Option<Duration>,
}

impl WorkRound {
	fn throttled() -> Self {
		Self::default()
	}
}

/// Per-session chunk budget.
///
/// Parsing may use `chunk_budget` of every `chunk_time` window. A window only
/// renews while the session has focus, so unfocused sessions go quiet once
/// their budget runs out. Each window grants at most one edit bonus.
#[derive(Debug, Clone)]
pub struct ParseWorker {
	config: WorkConfig,
	chunk_end: Option<Instant>,
	chunk_budget: Duration,
	bonus_granted: bool,
}

impl ParseWorker {
	pub fn new(config: WorkConfig) -> Self {
		Self {
			config,
			chunk_end: None,
			chunk_budget: Duration::ZERO,
			bonus_granted: false,
		}
	}

	pub fn chunk_budget(&self) -> Duration {
		self.chunk_budget
	}

	pub fn chunk_end(&self) -> Option<Instant> {
		self.chunk_end
	}

	/// Renews the chunk window when it has run out. After the first window,
	/// renewal requires focus.
	pub fn refill(&mut self, now: Instant, focused: bool) -> bool {
		let renew = match self.chunk_end {
			None => true,
			Some(end) => end < now && focused,
		};
		if renew {
			self.chunk_end = Some(now + self.config.chunk_time());
			self.chunk_budget = self.config.chunk_budget();
			self.bonus_granted = false;
			tracing::trace!(budget = ?self.chunk_budget, "parse.worker.chunk.refill");
		}
		renew
	}

	/// Grants the edit bonus to a focused session whose budget is spent,
	/// once per window.
	pub fn note_edit(&mut self, focused: bool) -> bool {
		if !focused || self.bonus_granted || !self.chunk_budget.is_zero() {
			return false;
		}
		self.chunk_budget = self.config.change_bonus();
		self.bonus_granted = true;
		tracing::trace!(budget = ?self.chunk_budget, "parse.worker.chunk.bonus");
		true
	}

	/// Time granted to one round. `deadline` is the idle time remaining, when
	/// the host reports it.
	pub fn slice(&self, deadline: Option<Duration>) -> Duration {
		let by_deadline = deadline.map_or(Duration::MAX, |remaining| {
			remaining.saturating_sub(self.config.deadline_margin()).max(self.config.min_slice())
		});
		self.chunk_budget.min(self.config.slice()).min(by_deadline)
	}

	/// Position to parse up to this round, and whether it stops exactly at
	/// the viewport edge.
	///
	/// A large document whose coverage is still short of the viewport is
	/// parsed to the viewport first; otherwise the round may look ahead.
	pub fn target(&self, tree_len: usize, doc_len: usize, viewport_to: usize) -> (usize, bool) {
		let viewport_first = tree_len < viewport_to && doc_len > viewport_to + self.config.viewport_first_margin;
		let ahead = if viewport_first { 0 } else { self.config.max_parse_ahead };
		(viewport_to.saturating_add(ahead), viewport_first)
	}

	/// Runs one scheduled invocation against `cx`.
	pub fn work_round<F: Fragment>(
		&mut self,
		cx: &mut ParseContext<F>,
		clock: &dyn Clock,
		focused: bool,
		viewport_to: usize,
		deadline: Option<Duration>,
	) -> Result<WorkRound, ParseError> {
		let start = clock.now();
		self.refill(start, focused);
		if self.chunk_budget.is_zero() {
			tracing::trace!("parse.worker.round.throttled");
			return Ok(WorkRound::throttled());
		}

		let slice = self.slice(deadline);
		let (target, viewport_first) = self.target(cx.tree_len(), cx.doc_len(), viewport_to);
		let worked = cx.work(slice, Some(target));
		let elapsed = clock.now().saturating_duration_since(start);
		self.chunk_budget = self.chunk_budget.saturating_sub(elapsed);
		let done = worked?;

		let publish = done || self.chunk_budget.is_zero();
		if publish {
			cx.take_tree()?;
		}
		let reschedule = !self.chunk_budget.is_zero() && !(done && !viewport_first);
		tracing::trace!(
			?slice,
			?elapsed,
			target,
			viewport_first,
			done,
			tree_len = cx.tree_len(),
			budget = ?self.chunk_budget,
			"parse.worker.round"
		);
		Ok(WorkRound {
			done,
			publish,
			reschedule,
			slice: Some(slice),
		})
	}
}
