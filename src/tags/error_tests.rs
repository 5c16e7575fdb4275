//! Unit tests for tag error types

#[cfg(test)]
mod tests {
    use crate::index::{IndexError, MessageId};
    use crate::tags::{TagError, TagId};
    use std::error::Error;

    #[test]
    fn test_invalid_slug_display() {
        let error = TagError::InvalidSlug("Bad Slug".to_string());
        assert_eq!(error.to_string(), "Invalid tag slug: Bad Slug");
    }

    #[test]
    fn test_already_exists_display() {
        let error = TagError::AlreadyExists {
            slug: "work".to_string(),
            name: "Work".to_string(),
        };
        assert_eq!(error.to_string(), "Tag already exists: work/Work");
    }

    #[test]
    fn test_not_found_display() {
        let error = TagError::NotFound("nope".to_string());
        assert_eq!(error.to_string(), "No such tag nope");
    }

    #[test]
    fn test_dependency_failure_has_source() {
        let error = TagError::DependencyFailure {
            tid: TagId::new("3"),
            source: IndexError::UnknownMessage(MessageId::new(36)),
        };
        assert!(error.to_string().contains("tag 3"));
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "Unknown message: 10");
    }

    #[test]
    fn test_validation_classification() {
        assert!(TagError::InvalidSlug(String::new()).is_validation());
        assert!(
            TagError::InvalidValue {
                field: "display".to_string(),
                value: "sideways".to_string(),
            }
            .is_validation()
        );
        assert!(!TagError::NotFound("x".to_string()).is_validation());
        assert!(
            !TagError::Ambiguous {
                token: "x".to_string(),
                count: 2,
            }
            .is_validation()
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TagError>();
    }
}
