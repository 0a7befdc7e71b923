use thiserror::Error;

/// Errors raised by parse drivers and parser implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	/// A partial parse was asked to stop below a bound it already has.
	#[error("stop bound {requested} is below the current bound {current}")]
	InvalidBound { requested: usize, current: usize },

	/// The parser implementation failed.
	#[error("parser failure: {0}")]
	Parser(String),
}

/// Errors raised while loading a [`WorkConfig`](crate::WorkConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The TOML source did not parse.
	#[error("invalid work config: {0}")]
	Toml(#[from] toml::de::Error),

	/// A value parsed but is inconsistent with another.
	#[error("invalid value for '{field}': {reason}")]
	Invalid { field: &'static str, reason: String },
}
