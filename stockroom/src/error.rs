//! Error types for stockroom

use crate::reconcile::ImportReport;
use std::fmt;
use stockroom_common::StoreError;

/// Unified error type for inventory operations
#[derive(Debug)]
pub enum LedgerError {
    /// No user is signed in
    Unauthenticated,
    /// A required field (the item name) is empty
    InvalidInput(String),
    /// The named item is not in the current snapshot
    NotFound(String),
    /// A record store call failed
    StoreUnavailable(StoreError),
    /// One or more rows of an import could not be written or deleted
    PartialImportFailure(ImportReport),
    /// Reading an import file or writing an export file failed
    Io(std::io::Error),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Unauthenticated => write!(f, "Not signed in"),
            LedgerError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            LedgerError::NotFound(name) => write!(f, "Item not found: {}", name),
            LedgerError::StoreUnavailable(e) => write!(f, "Store unavailable: {}", e),
            LedgerError::PartialImportFailure(report) => write!(
                f,
                "Import partially failed: {} record(s) not written: {}",
                report.failed.len(),
                report.failed.join(", ")
            ),
            LedgerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::StoreUnavailable(e) => Some(e),
            LedgerError::Io(e) => Some(e),
            LedgerError::Unauthenticated
            | LedgerError::InvalidInput(_)
            | LedgerError::NotFound(_)
            | LedgerError::PartialImportFailure(_) => None,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::StoreUnavailable(err)
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err)
    }
}

/// Result alias for inventory operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn store_error_converts_to_unavailable() {
        let err: LedgerError = StoreError::Unreachable("offline".to_string()).into();
        assert!(matches!(err, LedgerError::StoreUnavailable(_)));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Store unavailable: record store unreachable: offline"
        );
    }

    #[test]
    fn partial_import_lists_failed_keys() {
        let report = ImportReport {
            failed: vec!["bolt".to_string(), "nut".to_string()],
            ..ImportReport::default()
        };
        let err = LedgerError::PartialImportFailure(report);
        assert_eq!(
            err.to_string(),
            "Import partially failed: 2 record(s) not written: bolt, nut"
        );
    }

    #[test]
    fn invalid_input_display() {
        let err = LedgerError::InvalidInput("item name is empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: item name is empty");
        assert!(err.source().is_none());
    }
}
