//! Runtime error types.

/// Errors surfaced by [`crate::DuelHandle`] operations.
///
/// Dropped intents (busy turn lock, dice still rolling) are not errors:
/// they are logged and silently ignored by design.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The engine worker has shut down and no longer accepts commands.
    #[error("duel engine is no longer running")]
    EngineClosed,
}

/// Common result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
