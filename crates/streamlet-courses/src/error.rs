use streamlet_http::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("no course with id {id}")]
    UnknownCourse { id: u32 },

    #[error("invalid course changes: {message}")]
    InvalidChanges { message: String },
}

impl StoreError {
    #[must_use]
    pub fn invalid_changes(message: impl Into<String>) -> Self {
        Self::InvalidChanges {
            message: message.into(),
        }
    }

    /// The response status when the error came from a rejected request.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(error) => error.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_keep_their_status() {
        let err = StoreError::from(HttpError::Status {
            status: 404,
            body: String::new(),
        });
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "request failed with status 404");
        assert_eq!(StoreError::UnknownCourse { id: 7 }.status(), None);
    }
}
