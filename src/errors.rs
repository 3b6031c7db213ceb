// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for destroy orchestration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ReconciliationCheckResult;
use crate::events::{Diagnostic, StreamFailure};

/// Errors returned by the engine client
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Destroy refused until drift is reconciled
    #[error("Destroy blocked by drift: {message}")]
    DriftBlocked {
        message: String,
        /// Changeset the blocked request was made with
        changeset_id: String,
        reconciliation: Box<ReconciliationCheckResult>,
    },

    /// The changeset was staged for a deploy
    #[error("Changeset type mismatch: {message}")]
    ChangesetTypeMismatch { message: String },

    /// Pre-flight validation failed
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// Any other request failure
    #[error("Engine request failed: {0}")]
    Request(String),
}

/// Result type for engine client calls
pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Request(err.to_string())
    }
}

/// Terminal error of a destroy session.
///
/// Handed to the presentation layer as data; the reducer never propagates
/// it as a control-flow error.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestroyError {
    /// Re-stage the changeset for a destroy
    #[error("Changeset type mismatch: {message}")]
    ChangesetTypeMismatch { message: String },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// Failure reported by the server mid-stream
    #[error("Stream error: {message}")]
    Stream {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// The event channel closed before a finish event arrived
    #[error("Event stream closed unexpectedly")]
    StreamClosedUnexpectedly,

    #[error("Reconciliation failed: {message}")]
    Reconciliation { message: String },

    /// Any other engine failure
    #[error("Engine error: {message}")]
    Engine { message: String },
}

impl From<StreamFailure> for DestroyError {
    fn from(failure: StreamFailure) -> Self {
        DestroyError::Stream {
            message: failure.message,
            diagnostics: failure.diagnostics,
        }
    }
}

impl From<EngineError> for DestroyError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ChangesetTypeMismatch { message } => {
                DestroyError::ChangesetTypeMismatch { message }
            }
            EngineError::Validation {
                message,
                diagnostics,
            } => DestroyError::Validation {
                message,
                diagnostics,
            },
            other => DestroyError::Engine {
                message: other.to_string(),
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Either an instance ID or an instance name is required")]
    MissingInstance,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_maps_to_session_error() {
        let err: DestroyError = EngineError::Validation {
            message: "bad blueprint".to_string(),
            diagnostics: vec![Diagnostic {
                level: "error".to_string(),
                message: "missing field".to_string(),
                line: Some(3),
                column: None,
            }],
        }
        .into();
        assert!(matches!(err, DestroyError::Validation { ref diagnostics, .. } if diagnostics.len() == 1));

        let err: DestroyError = EngineError::Request("connection refused".to_string()).into();
        assert_eq!(
            err,
            DestroyError::Engine {
                message: "Engine request failed: connection refused".to_string()
            }
        );
    }

    #[test]
    fn test_stream_failure_keeps_diagnostics() {
        let err = DestroyError::from(StreamFailure {
            message: "provider crashed".to_string(),
            diagnostics: vec![Diagnostic::default()],
        });
        assert_eq!(err.to_string(), "Stream error: provider crashed");
    }

    #[test]
    fn test_session_error_serializes_with_kind_tag() {
        let value = serde_json::to_value(DestroyError::StreamClosedUnexpectedly).unwrap();
        assert_eq!(value["kind"], "stream_closed_unexpectedly");
    }
}
