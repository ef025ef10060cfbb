//! Document validation before local state is overwritten.

use crate::error::ValidationError;

/// Top-level key every well-formed record collection carries.
pub const COLLECTION_MARKER: &str = "tasks:";

/// Check that `main` looks like a task collection.
///
/// Only the presence of the marker is required; the full schema belongs to
/// the storage layer. This guards against replacing local tasks with an
/// unrelated or corrupted remote payload.
pub fn validate_main_document(main: &[u8]) -> Result<(), ValidationError> {
    let marker = COLLECTION_MARKER.as_bytes();
    if main.windows(marker.len()).any(|w| w == marker) {
        Ok(())
    } else {
        Err(ValidationError::MissingMarker {
            marker: COLLECTION_MARKER,
            len: main.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collection_is_valid() {
        validate_main_document(b"tasks: []\n").unwrap();
    }

    #[test]
    fn test_marker_anywhere_is_valid() {
        validate_main_document(b"# taskflow\nversion: 2\ntasks:\n- id: 1\n").unwrap();
    }

    #[test]
    fn test_missing_marker_rejected() {
        let err = validate_main_document(b"<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ValidationError::MissingMarker { len: 25, .. }));
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(validate_main_document(b"").is_err());
    }
}
