use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Color string that is not six hex digits (optionally prefixed with `#`)
    #[error("invalid color {0:?}")]
    InvalidColor(String),

    /// The device answered with a non-2xx status
    #[error("HTTP {0}")]
    Status(u16),

    /// Connection, timeout or body read failure below HTTP status level
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid framebuffer encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid base address {0:?}")]
    InvalidAddress(String),

    /// Sprite files need `panelCols`, `panelRows` and `data`
    #[error("sprite is missing {0}")]
    IncompleteSprite(&'static str),

    #[error("no device address configured")]
    NotConnected,
}

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
