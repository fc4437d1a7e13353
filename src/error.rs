//! Error types for tiny-audio-hal.
//!
//! Errors are split into three categories:
//! - **Status errors** ([`HalError`]): Returned synchronously to the host framework
//! - **Transport errors** ([`TransportError`]): Reported by PCM and mixer primitives,
//!   logged and swallowed everywhere except PCM negotiation
//! - **Configuration errors** ([`ConfigError`]): Loading a [`HalConfig`](crate::HalConfig)

use std::path::PathBuf;

/// Status code for a successful call.
pub const NO_ERROR: i32 = 0;
/// Status code for [`HalError::NotInitialized`] (`-ENODEV`).
pub const NO_INIT: i32 = -19;
/// Status code for [`HalError::BadValue`] (`-EINVAL`).
pub const BAD_VALUE: i32 = -22;
/// Status code for [`HalError::InvalidOperation`] (`-ENOSYS`).
pub const INVALID_OPERATION: i32 = -38;

/// Failures surfaced to the caller of a HAL entry point.
///
/// Every variant maps onto one of the integer status codes an audio framework
/// expects, see [`HalError::status()`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HalError {
    /// The hardware handle is absent, or the operation is a stub.
    #[error("not initialized: {reason}")]
    NotInitialized {
        /// What is missing.
        reason: String,
    },

    /// The stream slot is already occupied, or the operation is not supported.
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// Why the operation was refused.
        reason: String,
    },

    /// Requested parameters are unsupported, a parameter string failed
    /// validation, or PCM negotiation ran out of fallback rates.
    #[error("bad value: {reason}")]
    BadValue {
        /// Which value was rejected.
        reason: String,
    },
}

impl HalError {
    /// Creates a not-initialized error with the given reason.
    pub fn not_initialized(reason: impl Into<String>) -> Self {
        Self::NotInitialized {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-operation error with the given reason.
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Creates a bad-value error with the given reason.
    pub fn bad_value(reason: impl Into<String>) -> Self {
        Self::BadValue {
            reason: reason.into(),
        }
    }

    /// Returns the framework status code for this error.
    #[must_use]
    pub fn status(&self) -> i32 {
        match self {
            Self::NotInitialized { .. } => NO_INIT,
            Self::InvalidOperation { .. } => INVALID_OPERATION,
            Self::BadValue { .. } => BAD_VALUE,
        }
    }
}

/// Converts a HAL result into the framework status code.
pub fn status_of<T>(result: &Result<T, HalError>) -> i32 {
    match result {
        Ok(_) => NO_ERROR,
        Err(e) => e.status(),
    }
}

/// A PCM or mixer transport primitive failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the transport's description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from loading or validating a [`HalConfig`](crate::HalConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config file error: {path}: {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-config error with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}
