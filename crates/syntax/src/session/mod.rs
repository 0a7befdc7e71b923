//! Host-facing parse session.
//!
//! A [`ParseSession`] owns the [`ModelState`] for one document and drives it
//! from host idle time. Trees are published through a watch channel so hosts
//! can react without polling.
//!
//! # Scheduling
//!
//! At most one idle callback is outstanding per session. Callbacks hold a
//! weak reference, so a dropped session never runs work. When a parse
//! registers a trigger, the session waits for it on a
//! [`TaskClass::Trigger`] task and schedules another round once it resolves.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use lull_primitives::{Bias, ChangeSet, Range, Rope};
use lull_worker::{Clock, IdleDeadline, IdleHandle, IdleScheduler, SystemClock, TaskClass, TokioIdleScheduler, spawn};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::WorkConfig;
use crate::context::ParseContext;
use crate::error::ParseError;
use crate::fragment::Fragment;
use crate::model::{ModelState, ModelSupport};
use crate::scheduler::ParseWorker;
use crate::tree::Tree;


/// Construction options for a [`ParseSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
	pub clock: Arc<dyn Clock>,
	pub config: WorkConfig,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			clock: Arc::new(SystemClock),
			config: WorkConfig::default(),
		}
	}
}

struct State<F: Fragment> {
	model: Option<ModelState<F>>,
	worker: ParseWorker,
	working: Option<IdleHandle>,
	work_scheduled: usize,
	focused: bool,
	viewport: Range,
	destroyed: bool,
}

struct Shared<F: Fragment> {
	state: Mutex<State<F>>,
	support: Option<ModelSupport<F>>,
	scheduler: Arc<dyn IdleScheduler>,
	clock: Arc<dyn Clock>,
	config: WorkConfig,
	published: watch::Sender<Option<Tree<F>>>,
}

/// Background parser for one document.
///
/// Sessions without [`ModelSupport`] stay inert: every query reports no tree.
pub struct ParseSession<F: Fragment> {
	shared: Arc<Shared<F>>,
}

impl<F: Fragment> ParseSession<F> {
	/// Opens a session, running the initial bounded parse synchronously.
	pub fn new(
		doc: Rope,
		support: Option<ModelSupport<F>>,
		scheduler: Arc<dyn IdleScheduler>,
		options: SessionOptions,
	) -> Result<Self, ParseError> {
		let SessionOptions { clock, config } = options;
		let model = support
			.as_ref()
			.map(|support| ModelState::init(support, doc, Arc::clone(&clock), config))
			.transpose()?;
		let viewport = model.as_ref().map_or_else(Range::default, |model| model.context().viewport());
		let (published, _) = watch::channel(model.as_ref().map(|model| model.tree().clone()));

		let shared = Arc::new(Shared {
			state: Mutex::new(State {
				model,
				worker: ParseWorker::new(config),
				working: None,
				work_scheduled: 0,
				focused: false,
				viewport,
				destroyed: false,
			}),
			support,
			scheduler,
			clock,
			config,
			published,
		});
		{
			let mut state = shared.state.lock();
			shared.schedule_work(&mut state);
			shared.check_async_schedule(&mut state);
		}
		tracing::debug!(model = shared.support.as_ref().map(ModelSupport::name), "parse.session.open");
		Ok(Self { shared })
	}

	/// Opens a session driven by a fixed-delay tokio timer.
	pub fn with_tokio(doc: Rope, support: Option<ModelSupport<F>>, options: SessionOptions) -> Result<Self, ParseError> {
		let scheduler = Arc::new(TokioIdleScheduler::new(options.config.max_pause()));
		Self::new(doc, support, scheduler, options)
	}

	/// Moves the session to the document produced by `changes`.
	pub fn apply_edit(&self, changes: &ChangeSet, doc: Rope) -> Result<(), ParseError> {
		let mut state = self.shared.state.lock();
		if state.destroyed {
			return Ok(());
		}
		if let Some(model) = state.model.as_mut() {
			*model = model.apply(changes, doc)?;
			self.shared.published.send_replace(Some(model.tree().clone()));
			let vp = state.viewport;
			state.viewport = Range::new(changes.map_pos(vp.from, Bias::Left), changes.map_pos(vp.to, Bias::Right));
		}
		self.shared.update(&mut state, true)
	}

	/// Reports the visible range.
	pub fn set_viewport(&self, viewport: Range) -> Result<(), ParseError> {
		let mut state = self.shared.state.lock();
		if state.destroyed {
			return Ok(());
		}
		let doc_len = state.model.as_ref().map_or(0, |model| model.context().doc_len());
		state.viewport = viewport.clamp(doc_len);
		self.shared.update(&mut state, false)
	}

	/// Reports whether the host view has focus. Regaining focus resumes a
	/// session whose chunk window ran out.
	pub fn set_focus(&self, focused: bool) {
		let mut state = self.shared.state.lock();
		state.focused = focused;
		if focused {
			self.shared.schedule_work(&mut state);
		}
	}

	/// The published tree.
	pub fn tree(&self) -> Option<Tree<F>> {
		let state = self.shared.state.lock();
		state.model.as_ref().map(|model| model.tree().clone())
	}

	/// Parses synchronously until `[0, upto)` is covered or `timeout` runs
	/// out, defaulting to the configured ensure timeout.
	///
	/// Returns the context's tree only when the coverage was reached.
	pub fn ensure_tree(&self, upto: usize, timeout: Option<Duration>) -> Result<Option<Tree<F>>, ParseError> {
		let mut state = self.shared.state.lock();
		let Some(model) = state.model.as_mut() else {
			return Ok(None);
		};
		let cx = model.context_mut();
		if !cx.is_done(upto) {
			let timeout = timeout.unwrap_or(self.shared.config.ensure_timeout());
			cx.work(timeout, Some(upto))?;
		}
		let tree = cx.is_done(upto).then(|| cx.tree().clone());
		tracing::debug!(upto, reached = tree.is_some(), "parse.session.ensure");
		self.shared.schedule_work(&mut state);
		Ok(tree)
	}

	/// True when `[0, upto)` is covered, the whole document when `None`.
	pub fn tree_available(&self, upto: Option<usize>) -> bool {
		let state = self.shared.state.lock();
		state.model.as_ref().is_some_and(|model| {
			let cx = model.context();
			cx.is_done(upto.unwrap_or(cx.doc_len()))
		})
	}

	/// True while an idle round is queued or a trigger is being awaited.
	pub fn parser_running(&self) -> bool {
		let state = self.shared.state.lock();
		state.working.is_some() || state.work_scheduled > 0
	}

	/// Receives every tree the session publishes.
	pub fn subscribe(&self) -> watch::Receiver<Option<Tree<F>>> {
		self.shared.published.subscribe()
	}

	pub fn model_name(&self) -> Option<&str> {
		self.shared.support.as_ref().map(ModelSupport::name)
	}

	/// Runs `f` against the live context.
	pub fn with_context<R>(&self, f: impl FnOnce(&ParseContext<F>) -> R) -> Option<R> {
		let state = self.shared.state.lock();
		state.model.as_ref().map(|model| f(model.context()))
	}

	/// Cancels outstanding work. Later updates are ignored.
	pub fn destroy(&self) {
		let mut state = self.shared.state.lock();
		if state.destroyed {
			return;
		}
		state.destroyed = true;
		if let Some(handle) = state.working.take() {
			handle.cancel();
		}
		tracing::debug!("parse.session.destroy");
	}
}

impl<F: Fragment> Drop for ParseSession<F> {
	fn drop(&mut self) {
		self.destroy();
	}
}

impl<F: Fragment> fmt::Debug for ParseSession<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.shared.state.lock();
		f.debug_struct("ParseSession")
			.field("model", &self.model_name())
			.field("viewport", &state.viewport)
			.field("focused", &state.focused)
			.field("working", &state.working.is_some())
			.field("work_scheduled", &state.work_scheduled)
			.finish_non_exhaustive()
	}
}

impl<F: Fragment> Shared<F> {
	fn update(self: &Arc<Self>, state: &mut State<F>, doc_changed: bool) -> Result<(), ParseError> {
		let viewport = state.viewport;
		let Some(model) = state.model.as_mut() else {
			return Ok(());
		};
		let cx = model.context_mut();
		if cx.update_viewport(viewport)? || viewport.to > cx.tree_len() {
			self.schedule_work(state);
		}
		if doc_changed {
			if state.worker.note_edit(state.focused) {
				tracing::trace!("parse.session.edit_bonus");
			}
			self.schedule_work(state);
		}
		self.check_async_schedule(state);
		Ok(())
	}

	/// Requests an idle round unless one is queued or the published tree is
	/// already final.
	fn schedule_work(self: &Arc<Self>, state: &mut State<F>) {
		if state.working.is_some() || state.destroyed {
			return;
		}
		let Some(model) = state.model.as_ref() else {
			return;
		};
		let cx = model.context();
		if model.is_published() && cx.is_done(cx.doc_len()) {
			return;
		}

		let weak: Weak<Self> = Arc::downgrade(self);
		let handle = self.scheduler.request_idle(Box::new(move |deadline| {
			if let Some(shared) = weak.upgrade() {
				shared.run(deadline.map(|d| d.time_remaining()));
			}
		}));
		state.working = Some(handle);
		tracing::trace!("parse.session.schedule");
	}

	/// Body of one idle callback.
	fn run(self: &Arc<Self>, deadline: Option<Duration>) {
		let mut state = self.state.lock();
		state.working = None;
		if state.destroyed {
			return;
		}

		let round = {
			let State {
				model,
				worker,
				focused,
				viewport,
				..
			} = &mut *state;
			let Some(model) = model.as_mut() else {
				return;
			};
			let round = worker.work_round(model.context_mut(), &*self.clock, *focused, viewport.to, deadline);
			if let Ok(round) = &round
				&& round.publish
			{
				let tree = model.publish();
				tracing::debug!(to = tree.to(), "parse.session.publish");
				self.published.send_replace(Some(tree));
			}
			round
		};

		match round {
			Ok(round) if round.reschedule => self.schedule_work(&mut state),
			Ok(_) => {}
			Err(err) => tracing::error!(error = %err, "parse.session.round.failed"),
		}
		self.check_async_schedule(&mut state);
	}

	/// Waits on the trigger a parse registered, then schedules another round.
	fn check_async_schedule(self: &Arc<Self>, state: &mut State<F>) {
		let Some(model) = state.model.as_mut() else {
			return;
		};
		let Some(trigger) = model.context_mut().take_schedule_on() else {
			return;
		};
		state.work_scheduled += 1;
		tracing::trace!(pending = state.work_scheduled, "parse.session.trigger.wait");

		let weak: Weak<Self> = Arc::downgrade(self);
		spawn(TaskClass::Trigger, async move {
			let outcome = trigger.wait().await;
			let Some(shared) = weak.upgrade() else {
				return;
			};
			let mut state = shared.state.lock();
			match outcome {
				Ok(()) => shared.schedule_work(&mut state),
				Err(err) => tracing::warn!(error = %err, "parse.session.trigger.rejected"),
			}
			state.work_scheduled -= 1;
		});
	}
}
