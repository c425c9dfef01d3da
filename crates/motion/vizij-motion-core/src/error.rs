//! Error types for signals, threads and tweening

use serde::{Deserialize, Serialize};

/// Errors surfaced by the motion core.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionError {
    /// A dependency context tried to collect while already collecting.
    #[error("A circular dependency occurred between signals: {context}")]
    CircularDependency { context: String },

    /// A context stack was popped out of LIFO order.
    #[error("{stack} stack is out of order: expected {expected}, got {actual}")]
    StackOrder {
        stack: String,
        expected: String,
        actual: String,
    },

    /// A `use_*` accessor was called with an empty stack.
    #[error("The {context} is not available in the current context.")]
    MissingContext { context: String },

    /// A signal parser rejected a value.
    #[error("Failed to parse signal value: {reason}")]
    Parse { reason: String },

    /// The signal was read after being disposed.
    #[error("Signal {name} has been disposed")]
    Disposed { name: String },

    /// Physical spring parameters that cannot be simulated.
    #[error(
        "Invalid spring parameters: mass = {mass}, stiffness = {stiffness}, damping = {damping}"
    )]
    InvalidSpringParameters {
        mass: f64,
        stiffness: f64,
        damping: f64,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// A user supplied callback or factory failed.
    #[error("Callback failed: {reason}")]
    Callback { reason: String },
}

impl MotionError {
    /// Create a parse error from any displayable reason.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(context: &str) -> Self {
        Self::MissingContext {
            context: context.to_string(),
        }
    }

    /// Check if the scheduler may keep running after this error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidSpringParameters { .. } | Self::Disposed { .. } | Self::Callback { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::CircularDependency { .. } => "dependency",
            Self::StackOrder { .. } | Self::MissingContext { .. } => "context",
            Self::Parse { .. } | Self::Disposed { .. } => "signal",
            Self::InvalidSpringParameters { .. } => "tweening",
            Self::Config { .. } => "config",
            Self::Callback { .. } => "callback",
        }
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for MotionError {
    fn from(err: anyhow::Error) -> Self {
        // Keep errors that already are ours instead of flattening them.
        match err.downcast::<MotionError>() {
            Ok(inner) => inner,
            Err(other) => Self::Callback {
                reason: format!("{other:#}"),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, MotionError>;
