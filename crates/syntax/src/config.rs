//! Tunables for the parse driver and the idle-time scheduler.
//!
//! Durations are stored as milliseconds so configs read naturally in TOML:
//!
//! ```toml
//! slice_ms = 50
//! chunk_budget_ms = 1500
//! max_parse_ahead = 20000
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Work budgets and heuristics.
///
/// The viewport heuristics (`max_parse_ahead`, `viewport_first_margin`) only
/// shape how much work happens ahead of the visible region; coverage
/// guarantees hold for any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkConfig {
	/// Work performed synchronously when a new document version arrives.
	pub apply_ms: u64,
	/// Smallest slice handed to an idle callback, and the per-step hint used
	/// while forcing a parse to finish.
	pub min_slice_ms: u64,
	/// Largest slice handed to an idle callback.
	pub slice_ms: u64,
	/// Pause before an idle slice when the host has no idle signal.
	pub max_pause_ms: u64,
	/// Parse time allowed per chunk window.
	pub chunk_budget_ms: u64,
	/// Length of one chunk window.
	pub chunk_time_ms: u64,
	/// Budget granted per focused edit once a chunk is exhausted.
	pub change_bonus_ms: u64,
	/// Safety margin subtracted from an idle deadline.
	pub deadline_margin_ms: u64,
	/// Default timeout for synchronous coverage requests.
	pub ensure_timeout_ms: u64,
	/// How far past the viewport to keep parsing, in characters.
	pub max_parse_ahead: usize,
	/// Viewport end assumed before the host reports one.
	pub init_viewport: usize,
	/// Documents must extend this far past the viewport before the worker
	/// stops exactly at the viewport edge.
	pub viewport_first_margin: usize,
}

impl Default for WorkConfig {
	fn default() -> Self {
		Self {
			apply_ms: 20,
			min_slice_ms: 25,
			slice_ms: 100,
			max_pause_ms: 500,
			chunk_budget_ms: 3_000,
			chunk_time_ms: 30_000,
			change_bonus_ms: 50,
			deadline_margin_ms: 5,
			ensure_timeout_ms: 50,
			max_parse_ahead: 100_000,
			init_viewport: 3_000,
			viewport_first_margin: 1_000,
		}
	}
}

impl WorkConfig {
	/// Parses and validates a TOML config. Missing keys keep their defaults.
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		let cfg: Self = toml::from_str(src)?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// Checks cross-field consistency.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.min_slice_ms > self.slice_ms {
			return Err(ConfigError::Invalid {
				field: "min_slice_ms",
				reason: format!("{} exceeds slice_ms {}", self.min_slice_ms, self.slice_ms),
			});
		}
		if self.chunk_budget_ms > self.chunk_time_ms {
			return Err(ConfigError::Invalid {
				field: "chunk_budget_ms",
				reason: format!("{} exceeds chunk_time_ms {}", self.chunk_budget_ms, self.chunk_time_ms),
			});
		}
		Ok(())
	}

	pub fn apply(&self) -> Duration {
		Duration::from_millis(self.apply_ms)
	}

	pub fn min_slice(&self) -> Duration {
		Duration::from_millis(self.min_slice_ms)
	}

	pub fn slice(&self) -> Duration {
		Duration::from_millis(self.slice_ms)
	}

	pub fn max_pause(&self) -> Duration {
		Duration::from_millis(self.max_pause_ms)
	}

	pub fn chunk_budget(&self) -> Duration {
		Duration::from_millis(self.chunk_budget_ms)
	}

	pub fn chunk_time(&self) -> Duration {
		Duration::from_millis(self.chunk_time_ms)
	}

	pub fn change_bonus(&self) -> Duration {
		Duration::from_millis(self.change_bonus_ms)
	}

	pub fn deadline_margin(&self) -> Duration {
		Duration::from_millis(self.deadline_margin_ms)
	}

	pub fn ensure_timeout(&self) -> Duration {
		Duration::from_millis(self.ensure_timeout_ms)
	}
}
