//! Configuration errors.

use std::fmt;

/// Errors produced when building or validating configuration.
///
/// # Variants
///
/// - **Validation**: Values are inconsistent or out of range (e.g. `n_embed`
///   not divisible by `n_head`). Raised by `Config::validate`; the message
///   names the rule that failed.
///
/// - **EnvVar**: An environment variable was set but could not be read (e.g.
///   invalid Unicode).
///
/// - **Parse**: An environment variable was set but could not be parsed into
///   the expected type (e.g. `PICOGPT_SEED=abc`). Unset it to fall back to
///   the default, or set a valid value.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration validation failed.
    Validation(String),

    /// Failed to read an environment variable.
    EnvVar {
        /// The full environment variable name.
        key: String,
        /// Underlying cause (e.g. NotUnicode).
        message: String,
    },

    /// Environment variable set but unparsable as the expected type.
    Parse {
        /// The full environment variable name.
        key: String,
        /// The raw value that failed to parse.
        value: String,
        /// Parse failure reason.
        message: String,
    },
}

impl ConfigError {
    /// Short message suitable for logging.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ConfigError::Validation(m) => m,
            ConfigError::EnvVar { message, .. } | ConfigError::Parse { message, .. } => message,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Validation(m) => write!(f, "config validation: {m}"),
            ConfigError::EnvVar { key, message } => write!(f, "env var {key}: {message}"),
            ConfigError::Parse {
                key,
                value,
                message,
            } => write!(f, "env var {key}={value:?}: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}
