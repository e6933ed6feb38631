#![forbid(unsafe_code)]

//! Error types for the persistence codec, key-value stores, and config loading.
//!
//! Table operations themselves are total and never return these; they are
//! logged and swallowed at the [`TreeTable`](crate::engine::TreeTable) boundary.

use std::fmt;
use std::io;

/// A key-value store could not complete a read or write.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store is not available (disabled, detached, poisoned).
    Unavailable(String),
    /// Writing the value would exceed the store's byte quota.
    QuotaExceeded { needed: usize, limit: usize },
    /// Underlying I/O failure.
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            Self::QuotaExceeded { needed, limit } => {
                write!(f, "quota exceeded: need {needed} bytes, limit {limit}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A snapshot could not be applied because it was taken from a table with a
/// different number of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreError {
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "snapshot has {} rows, table has {}",
            self.found, self.expected
        )
    }
}

impl std::error::Error for RestoreError {}

/// A visible row whose ancestor is hidden or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvariantViolation {
    pub row: usize,
    pub ancestor: usize,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} is visible but ancestor {} is hidden or closed",
            self.row, self.ancestor
        )
    }
}

impl std::error::Error for InvariantViolation {}

/// Saving or loading persisted visibility state failed.
#[derive(Debug)]
pub enum PersistError {
    Store(StoreError),
    Json(serde_json::Error),
    UnsupportedVersion { found: u64, expected: u64 },
    Restore(RestoreError),
    Invariant(InvariantViolation),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported persisted state version: {found} (expected {expected})"
            ),
            Self::Restore(e) => write!(f, "restore rejected: {e}"),
            Self::Invariant(e) => write!(f, "persisted state rejected: {e}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::UnsupportedVersion { .. } => None,
            Self::Restore(e) => Some(e),
            Self::Invariant(e) => Some(e),
        }
    }
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<RestoreError> for PersistError {
    fn from(e: RestoreError) -> Self {
        Self::Restore(e)
    }
}

impl From<InvariantViolation> for PersistError {
    fn from(e: InvariantViolation) -> Self {
        Self::Invariant(e)
    }
}

/// Loading or validating a [`TreeTableConfig`](crate::config::TreeTableConfig) failed.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_descriptive() {
        let e = StoreError::QuotaExceeded {
            needed: 120,
            limit: 64,
        };
        assert_eq!(e.to_string(), "quota exceeded: need 120 bytes, limit 64");

        let e = RestoreError {
            expected: 4,
            found: 3,
        };
        assert_eq!(e.to_string(), "snapshot has 3 rows, table has 4");

        let e = PersistError::UnsupportedVersion {
            found: 7,
            expected: 1,
        };
        assert!(e.to_string().contains("version: 7"));

        let e = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(e.to_string(), "validation errors: a; b");
    }

    #[test]
    fn persist_error_exposes_source() {
        use std::error::Error;
        let e: PersistError = RestoreError {
            expected: 2,
            found: 1,
        }
        .into();
        assert!(e.source().is_some());
        let e = PersistError::UnsupportedVersion {
            found: 2,
            expected: 1,
        };
        assert!(e.source().is_none());
    }
}
