use thiserror::Error;

/// Errors raised while declaring log metadata or opening sinks.
///
/// `Clone` so a class whose declarations failed to build can keep handing
/// the same error back on every lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("failed to load sink settings: {0}")]
    Config(String),

    #[error("failed to initialize log backend for '{destination}': {reason}")]
    Backend { destination: String, reason: String },

    #[error("template '{template}' must contain exactly two placeholders, found {found}")]
    InvalidTemplate { template: String, found: usize },

    #[error("'{class}' declares loggable '{property}' without an accessor")]
    UnknownProperty { class: String, property: String },

    #[error("'{class}' has no logger declaration; declare one before wrapping its methods")]
    MissingLoggerDeclaration { class: String },

    #[error("'{class}' has no instance logger declaration")]
    MissingInstanceLogger { class: String },

    #[error("unknown log level: {0}")]
    InvalidLevel(String),
}

impl From<config::ConfigError> for LogError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T, E = LogError> = std::result::Result<T, E>;
