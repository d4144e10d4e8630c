use thiserror::Error;

/// Core error type for the graph store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Template not found
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Command parameters could not be interpreted
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Edge endpoint does not reference an existing node
    #[error("Dangling edge: {0}")]
    DanglingEdge(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Imported document is not an agent document
    #[error("Import error: {0}")]
    ImportError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (CoreError::NodeNotFound("llm-1".to_string()), "Node not found: llm-1"),
            (CoreError::TemplateNotFound("nope".to_string()), "Template not found: nope"),
            (CoreError::InvalidParams("missing type".to_string()), "Invalid parameters: missing type"),
            (CoreError::DanglingEdge("a -> b".to_string()), "Dangling edge: a -> b"),
            (CoreError::SerializationError("eof".to_string()), "Serialization error: eof"),
            (CoreError::ImportError("not an agent".to_string()), "Import error: not an agent"),
            (CoreError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::SerializationError(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_str() {
        let error: CoreError = "test error message".into();
        assert_eq!(error, CoreError::Other("test error message".to_string()));
    }
}
