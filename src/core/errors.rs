// src/core/errors.rs

//! Defines the primary error type for the entire application.
//!
//! Fault codes are part of the wire contract and must be preserved verbatim
//! for CLI compatibility, so each variant maps to a fixed numeric code
//! rather than deriving one from the variant's discriminant.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within a component.
///
/// `thiserror` gives us `Display`/`Error` impls and `From` conversions for the
/// usual suspects (`io::Error`, `serde_json::Error`) without hand-written
/// boilerplate.
#[derive(Error, Debug, Clone)]
pub enum CobaltError {
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("serialization error: {0}")]
    Serde(Arc<serde_json::Error>),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("queue is draining: {0}")]
    Draining(String),

    #[error("dependency error: {0}")]
    DependencyError(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient failure contacting {component}: {message}")]
    Transient { component: String, message: String },

    #[error("fatal hardware condition: {0}")]
    FatalHardware(String),

    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CobaltError {
    /// The numeric fault code carried over the wire, preserved verbatim
    /// for CLI compatibility.
    pub fn fault_code(&self) -> i32 {
        match self {
            CobaltError::Validation(_) => 30,
            CobaltError::Draining(_) => 31,
            CobaltError::DependencyError(_) => 42,
            CobaltError::Conflict(_) => 20,
            CobaltError::Transient { .. } => 10,
            CobaltError::FatalHardware(_) => 50,
            CobaltError::UnknownMethod(_) => 2,
            CobaltError::AuthRequired => 3,
            CobaltError::Io(_) | CobaltError::Serde(_) | CobaltError::Internal(_) => 1,
        }
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        CobaltError::Validation(msg.into())
    }

    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        CobaltError::Conflict(msg.into())
    }

    pub fn transient<S: Into<String>>(component: S, message: S) -> Self {
        CobaltError::Transient {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        CobaltError::Internal(msg.into())
    }
}

impl From<std::io::Error> for CobaltError {
    fn from(e: std::io::Error) -> Self {
        CobaltError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for CobaltError {
    fn from(e: serde_json::Error) -> Self {
        CobaltError::Serde(Arc::new(e))
    }
}

pub type CobaltResult<T> = Result<T, CobaltError>;
