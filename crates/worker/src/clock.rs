use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of wall-clock time for budgets and deadlines.
pub trait Clock: Send + Sync + fmt::Debug {
	fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a parser and the scheduler driving it can
/// observe one timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
	base: Instant,
	offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl ManualClock {
	pub fn new() -> Self {
		Self {
			base: Instant::now(),
			offset: Arc::new(Mutex::new(Duration::ZERO)),
		}
	}

	/// Moves the clock forward by `by`.
	pub fn advance(&self, by: Duration) {
		*self.offset.lock() += by;
	}

	/// Time elapsed since the clock was created.
	pub fn elapsed(&self) -> Duration {
		*self.offset.lock()
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.base + *self.offset.lock()
	}
}
