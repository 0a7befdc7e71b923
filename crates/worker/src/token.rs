use tokio_util::sync::CancellationToken;

/// Cancellation handle for one scheduled idle callback.
///
/// Cancelling is idempotent and has no effect once the callback has started.
#[derive(Debug, Clone, Default)]
pub struct IdleHandle {
	cancel: CancellationToken,
}

impl IdleHandle {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true when cancellation is requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}
