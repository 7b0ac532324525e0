//! Errors raised by record store backends

use thiserror::Error;

/// Failure of a single record store call
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (network down, store offline)
    #[error("record store unreachable: {0}")]
    Unreachable(String),
    /// The backend reached but rejected or failed the operation
    #[error("record store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A stored document could not be encoded or decoded
    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// A previous holder of the backend lock panicked
    #[error("record store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Wrap any backend-specific error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Result alias for record store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn unreachable_display_includes_reason() {
        let err = StoreError::Unreachable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "record store unreachable: connection refused"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn backend_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = StoreError::backend(io);
        assert!(err.to_string().contains("disk full"));
        assert!(err.source().is_some());
    }

    #[test]
    fn encoding_converts_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = parse_err.into();
        assert!(matches!(err, StoreError::Encoding(_)));
    }
}
