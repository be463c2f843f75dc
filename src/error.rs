use thiserror::Error;

use crate::bridge::source::BridgeError;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("scope selector '{0}' matched no element")]
    ScopeNotFound(String),
}

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed mapping file ({context}): {reason}")]
    Malformed { context: String, reason: String },
}

#[derive(Error, Debug)]
pub enum FillError {
    /// The target vanished between planning and applying (page mutated).
    #[error("element '{target}' not found: {context}")]
    ElementNotFound { target: String, context: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config '{path}': {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum FormMasterError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Fill(#[from] FillError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, FormMasterError>;
