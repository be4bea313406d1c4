use thiserror::Error;

/// Failure reported by a remote collection call.
///
/// Transport-class failures (`Unreachable`, `Unavailable`, `Malformed`) put the
/// client into degraded mode. `Rejected` means the server understood the request
/// and refused it, so nothing is recorded locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

impl RemoteError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rejected(404, message)
    }

    /// Whether the failure should fall back to a local-only mutation.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unavailable { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::Unreachable(_) | Self::Malformed(_) => None,
        }
    }

    /// Short text suitable for a user-facing notice.
    pub fn message(&self) -> &str {
        match self {
            Self::Unreachable(message) | Self::Malformed(message) => message,
            Self::Unavailable { message, .. } | Self::Rejected { message, .. } => message,
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Missing required field '{field}' for {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl SyncError {
    pub fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::MissingField { entity, field }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl<T> From<std::sync::PoisonError<T>> for SyncError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(RemoteError::unreachable("connection refused").is_transport());
        assert!(
            RemoteError::Unavailable {
                status: 503,
                message: "maintenance".to_string()
            }
            .is_transport()
        );
        assert!(RemoteError::Malformed("not json".to_string()).is_transport());
        assert!(!RemoteError::rejected(400, "email is required").is_transport());
    }

    #[test]
    fn test_not_found_and_status() {
        let err = RemoteError::not_found("no such request");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "no such request");
        assert_eq!(RemoteError::unreachable("down").status(), None);
    }

    #[test]
    fn test_poison_maps_to_lock_error() {
        let lock = std::sync::Mutex::new(0);
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });
        let err: SyncError = lock.lock().unwrap_err().into();
        assert!(matches!(err, SyncError::LockError(_)));
    }
}
