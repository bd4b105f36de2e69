//! Data models for Maqam
//!
//! Defines the core data structure: a `Bookmark` saved against a page of
//! the reading document. Bookmarks are plain data; persistence wiring
//! lives entirely in the `storage` and `store` modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved reading position with a free-text note
///
/// Bookmarks are immutable after creation: there is no update operation,
/// only create and delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    /// Unique identifier
    pub id: Uuid,
    /// Page this bookmark refers to (1-based)
    pub page_number: u32,
    /// Free-text note, may be empty
    pub details: String,
    /// When this bookmark was created
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Create a new bookmark for the given page
    pub fn new(page_number: u32, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_number,
            details: details.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a bookmark with specific fields (for loading from storage)
    pub fn from_parts(
        id: Uuid,
        page_number: u32,
        details: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            page_number,
            details,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_new() {
        let bookmark = Bookmark::new(42, "second juz");
        assert_eq!(bookmark.page_number, 42);
        assert_eq!(bookmark.details, "second juz");
    }

    #[test]
    fn test_bookmark_ids_are_unique() {
        let a = Bookmark::new(1, "");
        let b = Bookmark::new(1, "");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_bookmark_empty_details_allowed() {
        let bookmark = Bookmark::new(7, "");
        assert!(bookmark.details.is_empty());
    }

    #[test]
    fn test_bookmark_from_parts() {
        let id = Uuid::new_v4();
        let created = Utc::now();
        let bookmark = Bookmark::from_parts(id, 100, "note".to_string(), created);
        assert_eq!(bookmark.id, id);
        assert_eq!(bookmark.page_number, 100);
        assert_eq!(bookmark.created_at, created);
    }

    #[test]
    fn test_bookmark_serialization() {
        let bookmark = Bookmark::new(614, "last page");
        let json = serde_json::to_string(&bookmark).unwrap();
        let deserialized: Bookmark = serde_json::from_str(&json).unwrap();
        assert_eq!(bookmark, deserialized);
    }
}
