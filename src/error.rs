//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, codec, and pool errors, and provides semantic variants
//! for configuration and argument validation. `TaskFailure` is the per-item record
//! collected by the parallel mapper instead of being propagated.
use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn invalid_arg(arg: &'static str, value: impl fmt::Display) -> Self {
        Error::InvalidArgument {
            arg,
            value: value.to_string(),
        }
    }
}

/// A single unit of work that did not complete.
///
/// The failing argument is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure<A> {
    /// The task function returned an error.
    Failed { arg: A, message: String },
    /// The task function panicked.
    Panicked { arg: A, message: String },
}

impl<A> TaskFailure<A> {
    pub fn arg(&self) -> &A {
        match self {
            TaskFailure::Failed { arg, .. } | TaskFailure::Panicked { arg, .. } => arg,
        }
    }

    pub fn into_arg(self) -> A {
        match self {
            TaskFailure::Failed { arg, .. } | TaskFailure::Panicked { arg, .. } => arg,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TaskFailure::Failed { message, .. } | TaskFailure::Panicked { message, .. } => message,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, TaskFailure::Panicked { .. })
    }
}

impl<A: fmt::Debug> fmt::Display for TaskFailure<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Failed { arg, message } => write!(f, "{:?}: {}", arg, message),
            TaskFailure::Panicked { arg, message } => {
                write!(f, "{:?}: panicked: {}", arg, message)
            }
        }
    }
}
