//! External completion signals.
//!
//! A [`Trigger`] resolves once, with success or failure, when some external
//! dependency becomes ready. The parse scheduler uses triggers to retry work
//! that was skipped while the dependency was missing.

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio::sync::watch;

use crate::{TaskClass, spawn};

type Outcome = Option<Result<(), TriggerError>>;

/// Failure outcome of a [`Trigger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
	/// The dependency reported a failure.
	#[error("trigger rejected: {0}")]
	Rejected(String),

	/// The completing side went away without settling.
	#[error("trigger dropped before settling")]
	Dropped,
}

/// Cloneable, awaitable completion signal.
#[derive(Clone)]
pub struct Trigger {
	rx: watch::Receiver<Outcome>,
}

/// Completing side of a [`Trigger`].
pub struct TriggerHandle {
	tx: watch::Sender<Outcome>,
}

impl fmt::Debug for Trigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Trigger").field("outcome", &*self.rx.borrow()).finish()
	}
}

impl Trigger {
	/// Creates an unsettled trigger and the handle that settles it.
	pub fn channel() -> (TriggerHandle, Trigger) {
		let (tx, rx) = watch::channel(None);
		(TriggerHandle { tx }, Trigger { rx })
	}

	/// A trigger that has already succeeded.
	pub fn resolved() -> Self {
		let (handle, trigger) = Self::channel();
		handle.resolve();
		trigger
	}

	/// Settles with the outcome of `fut`, driven on a spawned task.
	pub fn from_future<F, E>(fut: F) -> Self
	where
		F: Future<Output = Result<(), E>> + Send + 'static,
		E: fmt::Display + Send + 'static,
	{
		let (handle, trigger) = Self::channel();
		spawn(TaskClass::Trigger, async move {
			match fut.await {
				Ok(()) => handle.resolve(),
				Err(err) => handle.reject(err.to_string()),
			}
		});
		trigger
	}

	/// Combines two triggers into one that settles when both have.
	///
	/// Fails if either input fails. When both fail the second failure is
	/// logged and the first is reported.
	pub fn merge(self, other: Trigger) -> Trigger {
		let (handle, merged) = Self::channel();
		spawn(TaskClass::Trigger, async move {
			let (a, b) = tokio::join!(self.wait(), other.wait());
			let outcome = match (a, b) {
				(Ok(()), Ok(())) => Ok(()),
				(Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
				(Err(first), Err(second)) => {
					tracing::warn!(error = %second, "worker.trigger.merge.dropped_failure");
					Err(first)
				}
			};
			handle.settle(outcome);
		});
		merged
	}

	/// Returns true once the trigger has an outcome.
	pub fn is_settled(&self) -> bool {
		self.rx.borrow().is_some()
	}

	/// Waits for the outcome.
	pub async fn wait(&self) -> Result<(), TriggerError> {
		let mut rx = self.rx.clone();
		let outcome = match rx.wait_for(Option::is_some).await {
			Ok(value) => (*value).clone(),
			Err(_) => None,
		};
		outcome.unwrap_or(Err(TriggerError::Dropped))
	}
}

impl TriggerHandle {
	/// Settles the trigger successfully.
	pub fn resolve(self) {
		self.settle(Ok(()));
	}

	/// Settles the trigger with a failure.
	pub fn reject(self, reason: impl Into<String>) {
		self.settle(Err(TriggerError::Rejected(reason.into())));
	}

	fn settle(self, outcome: Result<(), TriggerError>) {
		self.tx.send_replace(Some(outcome));
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn resolved_trigger_is_settled() {
		let trigger = Trigger::resolved();
		assert!(trigger.is_settled());
		assert_eq!(trigger.wait().await, Ok(()));
	}

	#[tokio::test]
	async fn dropped_handle_reports_dropped() {
		let (handle, trigger) = Trigger::channel();
		drop(handle);
		assert_eq!(trigger.wait().await, Err(TriggerError::Dropped));
	}

	#[tokio::test]
	async fn merge_waits_for_both() {
		let (a, ta) = Trigger::channel();
		let (b, tb) = Trigger::channel();
		let merged = ta.merge(tb);

		a.resolve();
		tokio::time::sleep(Duration::from_millis(5)).await;
		assert!(!merged.is_settled());

		b.resolve();
		assert_eq!(merged.wait().await, Ok(()));
	}

	#[tokio::test]
	async fn merge_reports_either_failure() {
		let (a, ta) = Trigger::channel();
		let merged = ta.merge(Trigger::resolved());
		a.reject("grammar failed to load");
		assert_eq!(merged.wait().await, Err(TriggerError::Rejected("grammar failed to load".into())));
	}

	#[tokio::test]
	async fn from_future_maps_error() {
		let trigger = Trigger::from_future(async { Err::<(), _>("boom") });
		assert_eq!(trigger.wait().await, Err(TriggerError::Rejected("boom".into())));
	}

	#[tokio::test]
	async fn clones_observe_the_same_outcome() {
		let (handle, trigger) = Trigger::channel();
		let clone = trigger.clone();
		handle.resolve();
		assert_eq!(trigger.wait().await, Ok(()));
		assert_eq!(clone.wait().await, Ok(()));
	}
}
