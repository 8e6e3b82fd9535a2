//! Communication error types and handling

/// Communication error types for positioning sources
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommError {
    /// Operation attempted on a link that was never opened
    #[error("positioning link is not open")]
    NotConnected,
    /// Opening the link failed
    #[error("failed to connect to positioning source at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },
    /// Timeout waiting for the source
    #[error("positioning source timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// Low-level read failure
    #[error("positioning read failed: {reason}")]
    ReadFailed { reason: String },
    /// Data arrived but could not be decoded
    #[error("invalid positioning message: {details}")]
    InvalidMessage { details: String },
    /// Peer closed the link
    #[error("positioning source closed the connection")]
    Closed,
}

/// Result type for communication operations
pub type CommResult<T> = Result<T, CommError>;

/// Error recovery strategy for communication failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryStrategy {
    /// Try again on the next poll
    Retry,
    /// Close and reopen the link before retrying
    Reconnect,
    /// Drop the offending message and continue
    Skip,
}

impl CommError {
    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            CommError::NotConnected => RecoveryStrategy::Reconnect,
            CommError::ConnectionFailed { .. } => RecoveryStrategy::Reconnect,
            CommError::Timeout { .. } => RecoveryStrategy::Retry,
            CommError::ReadFailed { .. } => RecoveryStrategy::Retry,
            CommError::InvalidMessage { .. } => RecoveryStrategy::Skip,
            CommError::Closed => RecoveryStrategy::Reconnect,
        }
    }

    /// True if the next poll can succeed without reopening the link
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery_strategy(), RecoveryStrategy::Reconnect)
    }
}

impl From<std::io::Error> for CommError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe => CommError::Closed,
            _ => CommError::ReadFailed {
                reason: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_classification() {
        assert!(CommError::Timeout { timeout_ms: 1500 }.is_recoverable());
        assert!(CommError::InvalidMessage { details: "x".into() }.is_recoverable());
        assert!(!CommError::Closed.is_recoverable());
        assert!(!CommError::NotConnected.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert_eq!(CommError::from(eof), CommError::Closed);

        let other = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(CommError::from(other), CommError::ReadFailed { .. }));
    }
}
