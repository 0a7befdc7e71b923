/// Execution classes used for task spawning and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Deferred parse slices run from the idle scheduler.
	Idle,
	/// Waiters on external completion triggers.
	Trigger,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Trigger => "trigger",
		}
	}
}
