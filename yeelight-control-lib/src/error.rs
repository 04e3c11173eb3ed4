use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to a bulb or interpreting what it sent back.
#[derive(Error, Debug)]
pub enum Error {
    /// No reply line arrived within the request timeout.
    #[error("Yeelight did not answer within {0:?}")]
    Timeout(Duration),

    /// The bulb could not be reached, refused the connection, or the socket failed mid-exchange.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The bulb closed the connection before sending a reply line.
    #[error("Connection closed before a reply was received")]
    EmptyReply,

    /// The reply line was not valid JSON.
    #[error("Malformed reply: {0}")]
    MalformedReply(#[source] serde_json::Error),

    #[error("Failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    /// A location string without a recognisable host or port.
    #[error("Invalid location: {0:?}")]
    InvalidLocation(String),

    /// A discovery reply lacked a field a device cannot be built without.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// True for failures where bytes arrived but did not form a usable reply.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::EmptyReply | Error::MalformedReply(_))
    }
}
