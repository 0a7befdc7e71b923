//! Host idle-time scheduling.
//!
//! The parse scheduler never runs work inline with host updates. It asks an
//! [`IdleScheduler`] for a callback during low-priority time and keeps the
//! returned [`IdleHandle`] so the request can be withdrawn.

use std::mem;
use std::time::Duration;

use parking_lot::Mutex;

use crate::token::IdleHandle;
use crate::{TaskClass, spawn};

/// Remaining time in the idle period a callback was invoked in.
pub trait IdleDeadline {
	fn time_remaining(&self) -> Duration;
}

/// A fixed amount of remaining idle time.
impl IdleDeadline for Duration {
	fn time_remaining(&self) -> Duration {
		*self
	}
}

/// Callback run once during host idle time.
pub type IdleCallback = Box<dyn FnOnce(Option<&dyn IdleDeadline>) + Send + 'static>;

/// Low-priority scheduling primitive supplied by the host.
///
/// Implementations must not invoke `callback` from inside `request_idle`;
/// callers may hold locks while requesting.
pub trait IdleScheduler: Send + Sync {
	fn request_idle(&self, callback: IdleCallback) -> IdleHandle;
}

/// Fixed-delay timer scheduler for hosts with no idle-time signal.
///
/// Runs each callback `delay` after the request, without a deadline, on the
/// current tokio runtime.
#[derive(Debug, Clone, Copy)]
pub struct TokioIdleScheduler {
	delay: Duration,
}

impl Default for TokioIdleScheduler {
	fn default() -> Self {
		Self::new(Duration::from_millis(500))
	}
}

impl TokioIdleScheduler {
	pub fn new(delay: Duration) -> Self {
		Self { delay }
	}
}

impl IdleScheduler for TokioIdleScheduler {
	fn request_idle(&self, callback: IdleCallback) -> IdleHandle {
		let handle = IdleHandle::new();
		let token = handle.clone();
		let delay = self.delay;
		spawn(TaskClass::Idle, async move {
			tokio::select! {
				_ = token.cancelled() => {
					tracing::trace!("worker.idle.cancelled");
				}
				_ = tokio::time::sleep(delay) => {
					if !token.is_cancelled() {
						callback(None);
					}
				}
			}
		});
		handle
	}
}

/// Scheduler whose callbacks run only when the host pumps it.
///
/// Suits hosts with their own event loop, and deterministic tests.
#[derive(Default)]
pub struct ManualIdleScheduler {
	queue: Mutex<Vec<(IdleHandle, IdleCallback)>>,
}

impl ManualIdleScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of queued callbacks that have not been cancelled.
	pub fn pending(&self) -> usize {
		self.queue.lock().iter().filter(|(handle, _)| !handle.is_cancelled()).count()
	}

	/// Runs every callback queued so far and returns how many ran.
	///
	/// Callbacks requested while pumping are queued for the next call.
	pub fn run_pending(&self, deadline: Option<&dyn IdleDeadline>) -> usize {
		let batch = mem::take(&mut *self.queue.lock());
		let mut ran = 0;
		for (handle, callback) in batch {
			if handle.is_cancelled() {
				continue;
			}
			callback(deadline);
			ran += 1;
		}
		ran
	}
}

impl IdleScheduler for ManualIdleScheduler {
	fn request_idle(&self, callback: IdleCallback) -> IdleHandle {
		let handle = IdleHandle::new();
		self.queue.lock().push((handle.clone(), callback));
		handle
	}
}
