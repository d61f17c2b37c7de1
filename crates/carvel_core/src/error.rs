use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unsupported file type '{name}', please select one of: {}", registered.join(", "))]
    UnsupportedType {
        name: String,
        registered: Vec<String>,
    },

    #[error("File type '{0}' is already registered")]
    DuplicateTypeName(String),

    #[error("File type '{0}' has an empty signature")]
    EmptySignature(String),

    #[error("Source unreadable: {0}")]
    SourceUnreadable(#[from] std::io::Error),

    #[error("Scan cancelled at offset {offset}")]
    Cancelled { offset: u64 },
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_lists_registered_names() {
        let err = CoreError::UnsupportedType {
            name: "jpeg".to_string(),
            registered: vec!["lnk".to_string(), "prefetch".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("'jpeg'"));
        assert!(message.contains("lnk, prefetch"));
    }

    #[test]
    fn io_errors_become_source_unreadable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::SourceUnreadable(_)));
    }
}
