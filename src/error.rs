use thiserror::Error;

use crate::anthropic::AnthropicError;
use crate::workflow::Role;

#[derive(Debug, Error)]
pub enum HelpdeskError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Workflow error: {0}")]
    Engine(#[from] EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Anthropic API error: {0}")]
    Anthropic(#[from] AnthropicError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures that abort a workflow run instead of ending it through a guard.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no roles declared: register at least one worker capability")]
    EmptyRoleSet,

    #[error("entry role {0} has no registered worker capability")]
    UndeclaredEntryRole(Role),

    #[error("role {0} was entered without a registered worker capability")]
    MissingCapability(Role),

    #[error("worker {role} failed after {attempts} attempt(s): {message}")]
    WorkerFailed {
        role: Role,
        attempts: u32,
        message: String,
    },
}

/// Errors raised by the durable stores backing memory entries and tickets.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_failed_display() {
        let err = EngineError::WorkerFailed {
            role: Role::NetworkWorker,
            attempts: 3,
            message: "model stream error".into(),
        };
        assert_eq!(
            err.to_string(),
            "worker network-worker failed after 3 attempt(s): model stream error"
        );
    }

    #[test]
    fn engine_error_converts_into_top_level() {
        let err: HelpdeskError = EngineError::EmptyRoleSet.into();
        assert!(matches!(err, HelpdeskError::Engine(EngineError::EmptyRoleSet)));
        assert!(err.to_string().starts_with("Workflow error:"));
    }
}
