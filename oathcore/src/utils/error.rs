use thiserror::Error;

use crate::utils::check::{Violation, ViolationKind};

#[derive(Debug, Error)]
pub enum OathError {
    #[error(transparent)]
    Violation(#[from] Violation),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration to '{file}': {source}")]
    ConfigSerializeError {
        source: toml::ser::Error,
        file: String,
    },

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

impl OathError {
    /// Kind of the underlying runtime violation, if this error is one.
    pub fn violation_kind(&self) -> Option<ViolationKind> {
        match self {
            OathError::Violation(v) => Some(v.kind),
            _ => None,
        }
    }

    /// Extract the underlying violation, if this error is one.
    pub fn into_violation(self) -> Option<Violation> {
        match self {
            OathError::Violation(v) => Some(v),
            _ => None,
        }
    }
}

pub type OathResult<T> = Result<T, OathError>;
