use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("detection is missing field `{0}`")]
    MissingField(&'static str),
    #[error("detection timestamp is not epoch millis or RFC 3339: {0}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown transport '{0}', expected 'tcp' or 'stdio'")]
    UnknownTransport(String),
    #[error("backend address must not be empty")]
    EmptyAddress,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("UI platform error: {0}")]
    Platform(#[from] slint::PlatformError),
}
