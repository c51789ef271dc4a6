//! Error types for turnover computation.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use stockledger_filter::FilterError;
use thiserror::Error;

/// Errors raised by a [`SnapshotStore`](crate::SnapshotStore).
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read or written.
    #[error("failed to access snapshot file {}: {source}", path.display())]
    Io {
        /// Snapshot file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file exists but does not decode.
    #[error("corrupt snapshot file {}: {source}", path.display())]
    Corrupt {
        /// Snapshot file path.
        path: PathBuf,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot rows could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors surfaced by the turnover API.
///
/// Bad input ([`InvalidPeriod`](Self::InvalidPeriod),
/// [`Criterion`](Self::Criterion)) is kept apart from everything that went
/// wrong while computing, which is reported as a single
/// [`OperationFailed`](Self::OperationFailed) kind.
#[derive(Debug, Error)]
pub enum TurnoverError {
    /// The query window ends before it starts.
    #[error("invalid period: end {end} is before start {start}")]
    InvalidPeriod {
        /// Window start.
        start: NaiveDateTime,
        /// Window end.
        end: NaiveDateTime,
    },

    /// The filter criterion is malformed.
    #[error("invalid criterion: {0}")]
    Criterion(#[from] FilterError),

    /// The operation could not be completed.
    #[error("operation failed: {0}")]
    OperationFailed(#[from] SnapshotError),
}

impl TurnoverError {
    /// Whether this error describes bad input rather than a failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidPeriod { .. } | Self::Criterion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let start = stockledger_core::epoch();
        let invalid = TurnoverError::InvalidPeriod { start, end: start };
        assert!(invalid.is_validation());
        assert!(TurnoverError::from(FilterError::MissingKind).is_validation());

        let io = SnapshotError::Io {
            path: PathBuf::from("blocked.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let failed = TurnoverError::from(io);
        assert!(!failed.is_validation());
        assert!(failed
            .to_string()
            .starts_with("operation failed: failed to access snapshot file blocked.json"));
    }
}
