use thiserror::Error;

/// Error taxonomy for the audit pipeline.
///
/// Processors let `Network`/`Storage`/`Database` propagate so a job fails and
/// enters the queue's retry policy. `AuditTool` is caught at the call site and
/// degraded to zero scores. `Validation` is never worth retrying.
#[derive(Debug, Error)]
pub enum AuditError {
    /// External API or page navigation was unreachable.
    #[error("network error: {0}")]
    Network(String),

    /// The page-quality audit tool crashed or returned garbage.
    #[error("audit tool error: {0}")]
    AuditTool(String),

    /// Screenshot upload to object storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Database read or write failed.
    #[error("database error: {0}")]
    Database(String),

    /// Malformed job payload, e.g. an invalid URL.
    #[error("validation error: {0}")]
    Validation(String),
}

impl AuditError {
    /// Whether a job failing with this error should be retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AuditError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_not_retryable() {
        assert!(!AuditError::Validation("bad url".into()).is_retryable());
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AuditError::Network("timeout".into()).is_retryable());
        assert!(AuditError::Storage("upload failed".into()).is_retryable());
        assert!(AuditError::Database("connection reset".into()).is_retryable());
    }
}
