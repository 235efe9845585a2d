use crate::search_state::ErrorKind;
use thiserror::Error;

/// Result type for nearby operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nearby operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport failures and non-success responses from an upstream service
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Location permission has been denied or restricted
    #[error("Location permission denied")]
    PermissionDenied,

    /// The platform location service could not produce a position
    #[error("Location error: {0}")]
    Location(String),

    /// Reverse geocoding failed
    #[error("Geocoding error: {0}")]
    Geocoding(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a location error
    pub fn location(msg: impl Into<String>) -> Self {
        Self::Location(msg.into())
    }

    /// Creates a geocoding error
    pub fn geocoding(msg: impl Into<String>) -> Self {
        Self::Geocoding(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Classify the error into the user-facing taxonomy
    ///
    /// Everything that is not a permission, position or decode problem is
    /// reported as a network failure, since the only remaining failure source
    /// in a search is the transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Location(_) => ErrorKind::PositionUnavailable,
            Self::Decode(_) => ErrorKind::DecodeFailure,
            _ => ErrorKind::NetworkFailure,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(Error::PermissionDenied.kind(), ErrorKind::PermissionDenied);
        assert_eq!(
            Error::location("no fix").kind(),
            ErrorKind::PositionUnavailable
        );
        assert_eq!(Error::decode("bad json").kind(), ErrorKind::DecodeFailure);
        assert_eq!(Error::network("timeout").kind(), ErrorKind::NetworkFailure);
        assert_eq!(
            Error::Other(anyhow::anyhow!("boom")).kind(),
            ErrorKind::NetworkFailure
        );
    }

    #[test]
    fn test_context_wraps_source() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.context("reading config").unwrap_err();
        assert_eq!(err.to_string(), "reading config: missing");
    }
}
