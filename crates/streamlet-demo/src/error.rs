use std::convert::Infallible;

use streamlet_courses::StoreError;
use streamlet_http::{ConfigError, HttpError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("no answer for {what}")]
    NoAnswer { what: String },
}

impl From<Infallible> for DemoError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidArgument { .. } => 2,
            Self::Http(HttpError::Status { .. }) => 3,
            Self::Store(error) if error.status().is_some() => 3,
            Self::Store(StoreError::UnknownCourse { .. }) => 4,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_kind() {
        assert_eq!(DemoError::invalid("x").exit_code(), 2);
        assert_eq!(DemoError::from(ConfigError::ZeroTimeout).exit_code(), 2);
        let status = HttpError::Status {
            status: 500,
            body: String::new(),
        };
        assert_eq!(DemoError::from(status.clone()).exit_code(), 3);
        assert_eq!(DemoError::from(StoreError::from(status)).exit_code(), 3);
        assert_eq!(
            DemoError::from(StoreError::UnknownCourse { id: 1 }).exit_code(),
            4
        );
        assert_eq!(
            DemoError::NoAnswer {
                what: "x".into()
            }
            .exit_code(),
            1
        );
    }
}
