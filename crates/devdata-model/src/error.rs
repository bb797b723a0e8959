use thiserror::Error;

/// Errors raised while decoding a raw record into a [`crate::DeviceEvent`].
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("event id must not be empty")]
    EmptyEventId,
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown {what}: {value}")]
    UnknownVariant { what: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
