//! Error types for scenario loading and configuration persistence.

use thiserror::Error;

/// Authoring problems that make a scenario unusable.
///
/// Softer inconsistencies (dangling edge endpoints, highlight entries naming
/// unknown ids) are logged and skipped instead of reported here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
	/// Two nodes share the same id.
	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),
	/// Two edges share the same id.
	#[error("duplicate edge id `{0}`")]
	DuplicateEdge(String),
	/// The highlight table has no idle entry at index 0.
	#[error("scenario `{0}` has an empty highlight table")]
	EmptyHighlightTable(String),
	/// No scenario is registered under this id.
	#[error("unknown scenario `{0}`")]
	UnknownScenario(String),
}

/// Failures of the configuration persistence port.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The backing store could not be reached (e.g. storage disabled).
	#[error("storage unavailable: {0}")]
	Unavailable(String),
	/// The store refused the write (quota, privacy mode).
	#[error("storage rejected write for `{key}`: {reason}")]
	WriteRejected {
		/// Key that was being written.
		key: String,
		/// Backend-provided reason.
		reason: String,
	},
	/// The stored document could not be encoded or decoded.
	#[error("config serialization failed: {0}")]
	Serde(#[from] serde_json::Error),
}
