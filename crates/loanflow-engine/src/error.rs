//! Engine errors.

/// Errors that can occur while driving the status engine.
///
/// Script problems are not here: an unknown id in a script is a no-op at
/// run time and is caught ahead of time by scenario validation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// Configuration rejected at construction.
  #[error("invalid engine configuration: {message}")]
  InvalidConfig { message: String },

  /// `start` was called outside of a Tokio runtime.
  #[error("no tokio runtime available to drive the timeline")]
  NoRuntime,

  /// The engine was shut down and accepts no new runs.
  #[error("engine has been shut down")]
  ShutDown,
}
