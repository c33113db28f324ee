use thiserror::Error;

pub type Result<T> = std::result::Result<T, HttpError>;

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("connection failed: {message}")]
    Connect { message: String },

    #[error("request worker could not be started: {message}")]
    Spawn { message: String },

    #[error("transport failure: {message}")]
    Other { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout {
                url: error.url().map(ToString::to_string).unwrap_or_default(),
            };
        }
        if error.is_connect() {
            return Self::Connect {
                message: error.to_string(),
            };
        }
        Self::Other {
            message: error.to_string(),
        }
    }
}

/// Everything an HTTP stream can fail with. Delivered as the stream's single
/// error signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    #[error("response body could not be decoded: {message}")]
    Decode { message: String },

    #[error("request could not be encoded: {message}")]
    Encode { message: String },
}

impl HttpError {
    /// The response status, for [`HttpError::Status`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid value for {var}: {message}")]
    InvalidEnv { var: &'static str, message: String },

    #[error("HTTP client could not be built: {0}")]
    Client(#[from] reqwest::Error),
}
