use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
