//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use serde::Serialize;
use thiserror::Error;

/// Category of a failed precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Wrong execution identity for the step.
    PrivilegeError,
    /// Missing required interpreter or tool.
    EnvironmentError,
    /// Expected directory or file absent.
    LayoutError,
    /// Malformed secrets, bad settings, or proxy configuration rejected.
    ConfigError,
}

/// Fail-fast precondition errors. Each carries a diagnostic and a remediation hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("{message}\n  hint: {hint}")]
    Privilege { message: String, hint: String },

    #[error("{message}\n  hint: {hint}")]
    Environment { message: String, hint: String },

    #[error("{message}\n  hint: {hint}")]
    Layout { message: String, hint: String },

    #[error("{message}\n  hint: {hint}")]
    Config { message: String, hint: String },
}

impl DeployError {
    pub fn privilege(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Privilege {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn environment(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn layout(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn config(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: hint.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Privilege { .. } => ErrorKind::PrivilegeError,
            Self::Environment { .. } => ErrorKind::EnvironmentError,
            Self::Layout { .. } => ErrorKind::LayoutError,
            Self::Config { .. } => ErrorKind::ConfigError,
        }
    }

    /// Diagnostic without the hint line.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Privilege { message, .. }
            | Self::Environment { message, .. }
            | Self::Layout { message, .. }
            | Self::Config { message, .. } => message,
        }
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        match self {
            Self::Privilege { hint, .. }
            | Self::Environment { hint, .. }
            | Self::Layout { hint, .. }
            | Self::Config { hint, .. } => hint,
        }
    }
}
