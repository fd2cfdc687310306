use thiserror::Error;

/// Failure reported by a backing store while executing a compiled fragment.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SourceError {
    /// The store could not translate or accept the fragment. Eligible for
    /// local fallback when the engine allows it.
    #[error("store rejected query: {0}")]
    Rejected(String),

    #[error("store failure: {0}")]
    Failed(String),
}

impl SourceError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, SourceError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_rejection() {
        assert!(SourceError::Rejected("unsupported".to_string()).is_rejection());
        assert!(!SourceError::Failed("connection reset".to_string()).is_rejection());
    }
}
