//! Bookmark persistence and subscriptions
//!
//! The `Store` owns the SQLite collection of bookmarks and pushes change
//! notifications to explicitly registered observers.
//!
//! ## Write/notify ordering
//!
//! A mutation is fully committed (or fully failed) before any subscriber
//! is notified. This is the only ordering guarantee consumers may rely on:
//! a callback observing a `Created` event will find the record when it
//! queries.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(&config)?;
//!
//! let _sub = store.subscribe(|event| println!("{:?}", event));
//!
//! let bookmark = store.create(42, "second juz begins here")?;
//! store.delete(bookmark.id)?;
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::models::Bookmark;
use crate::storage::schema::{init_schema, needs_init};
use crate::storage::{StorageError, StorageResult};

/// A change committed to the bookmark collection
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A bookmark was created
    Created(Bookmark),
    /// The bookmark with this id was deleted
    Deleted(Uuid),
}

/// Sort key for bookmark queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Creation time (the default; descending = newest first)
    CreatedAt,
    /// Page number
    PageNumber,
}

type Callback = Box<dyn FnMut(&StoreEvent) + Send>;
type SubscriberList = Mutex<Vec<(u64, Callback)>>;

/// Handle to a registered observer
///
/// Dropping the subscription unregisters the callback. UI layers own
/// their subscription lifecycle explicitly; there is no implicit global
/// observer list.
pub struct Subscription {
    id: u64,
    subscribers: Weak<SubscriberList>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            if let Ok(mut list) = subscribers.lock() {
                list.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// Durable store for bookmark records
pub struct Store {
    conn: Connection,
    subscribers: Arc<SubscriberList>,
    next_subscriber_id: AtomicU64,
}

impl Store {
    /// Open the store at the configured database path, creating it on
    /// first run
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Self::open_at(&path)
    }

    /// Open the store at a specific database path
    pub fn open_at(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_with_connection(conn)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if needs_init(&conn) {
            init_schema(&conn)?;
        }
        Ok(Self {
            conn,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber_id: AtomicU64::new(0),
        })
    }

    /// Register an observer, notified after each committed mutation
    ///
    /// Returns a handle; dropping it unsubscribes.
    pub fn subscribe(&self, callback: impl FnMut(&StoreEvent) + Send + 'static) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut list) = self.subscribers.lock() {
            list.push((id, Box::new(callback)));
        }
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    fn notify(&self, event: &StoreEvent) {
        if let Ok(mut list) = self.subscribers.lock() {
            for (_, callback) in list.iter_mut() {
                callback(event);
            }
        }
    }

    // ==================== Mutations ====================

    /// Create a bookmark for the given page
    ///
    /// Allocates a fresh id, stamps the creation time and commits in a
    /// transaction; a partially-written record is never visible to
    /// readers. Subscribers are notified only after the commit succeeds.
    pub fn create(&mut self, page_number: u32, details: &str) -> StorageResult<Bookmark> {
        if page_number == 0 {
            return Err(StorageError::InvalidPage { page: page_number });
        }

        let bookmark = Bookmark::new(page_number, details);

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO bookmarks (id, page_number, details, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                bookmark.id.to_string(),
                bookmark.page_number,
                bookmark.details,
                bookmark.created_at.timestamp_millis(),
            ],
        )?;
        tx.commit()?;

        debug!(id = %bookmark.id, page = bookmark.page_number, "created bookmark");
        self.notify(&StoreEvent::Created(bookmark.clone()));
        Ok(bookmark)
    }

    /// Delete the bookmark with the given id
    ///
    /// Returns `true` if a record was removed. Deleting an absent
    /// (already deleted) id is a no-op returning `false` and fires no
    /// notification.
    pub fn delete(&mut self, id: Uuid) -> StorageResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?1", [id.to_string()])?;

        if affected == 0 {
            return Ok(false);
        }

        debug!(id = %id, "deleted bookmark");
        self.notify(&StoreEvent::Deleted(id));
        Ok(true)
    }

    // ==================== Queries ====================

    /// Get all bookmarks ordered by the given key
    ///
    /// Ties on `created_at` resolve by insertion recency, so newest-first
    /// ordering is total even for same-instant creates.
    pub fn query_all(&self, sort_key: SortKey, descending: bool) -> StorageResult<Vec<Bookmark>> {
        let sql = match (sort_key, descending) {
            (SortKey::CreatedAt, true) => {
                "SELECT id, page_number, details, created_at FROM bookmarks \
                 ORDER BY created_at DESC, rowid DESC"
            }
            (SortKey::CreatedAt, false) => {
                "SELECT id, page_number, details, created_at FROM bookmarks \
                 ORDER BY created_at ASC, rowid ASC"
            }
            (SortKey::PageNumber, true) => {
                "SELECT id, page_number, details, created_at FROM bookmarks \
                 ORDER BY page_number DESC, created_at DESC, rowid DESC"
            }
            (SortKey::PageNumber, false) => {
                "SELECT id, page_number, details, created_at FROM bookmarks \
                 ORDER BY page_number ASC, created_at DESC, rowid DESC"
            }
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(BookmarkRow {
                id: row.get(0)?,
                page_number: row.get(1)?,
                details: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut bookmarks = Vec::new();
        for row in rows {
            bookmarks.push(hydrate(row?)?);
        }
        Ok(bookmarks)
    }

    /// Get all bookmarks, newest first (the default presentation order)
    pub fn all(&self) -> StorageResult<Vec<Bookmark>> {
        self.query_all(SortKey::CreatedAt, true)
    }

    /// Get a bookmark by id
    pub fn get(&self, id: Uuid) -> StorageResult<Option<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, page_number, details, created_at FROM bookmarks WHERE id = ?1",
        )?;
        let mut rows = stmt.query([id.to_string()])?;

        match rows.next()? {
            Some(row) => {
                let row = BookmarkRow {
                    id: row.get(0)?,
                    page_number: row.get(1)?,
                    details: row.get(2)?,
                    created_at: row.get(3)?,
                };
                Ok(Some(hydrate(row)?))
            }
            None => Ok(None),
        }
    }

    /// Check whether at least one bookmark references the given page
    ///
    /// A transient scan over the collection; page_number carries no index.
    pub fn is_page_bookmarked(&self, page_number: u32) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE page_number = ?1)",
            [page_number],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Get the number of stored bookmarks
    pub fn count(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Raw row shape before id/timestamp validation
struct BookmarkRow {
    id: String,
    page_number: u32,
    details: String,
    created_at: i64,
}

fn hydrate(row: BookmarkRow) -> StorageResult<Bookmark> {
    let id = Uuid::parse_str(&row.id).map_err(|e| StorageError::CorruptRecord {
        id: Uuid::nil(),
        details: format!("bad id '{}': {}", row.id, e),
    })?;

    let created_at = Utc
        .timestamp_millis_opt(row.created_at)
        .single()
        .ok_or_else(|| StorageError::CorruptRecord {
            id,
            details: format!("bad timestamp {}", row.created_at),
        })?;

    Ok(Bookmark::from_parts(
        id,
        row.page_number,
        row.details,
        created_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            document: None,
            page_count: 614,
            log_file: None,
        }
    }

    #[test]
    fn test_open_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let _store = Store::open(&config).unwrap();
        assert!(config.sqlite_path().exists());
    }

    #[test]
    fn test_create_and_get() {
        let mut store = Store::open_in_memory().unwrap();

        let bookmark = store.create(42, "note A").unwrap();

        let retrieved = store.get(bookmark.id).unwrap().unwrap();
        assert_eq!(retrieved, bookmark);
        assert_eq!(retrieved.page_number, 42);
        assert_eq!(retrieved.details, "note A");
    }

    #[test]
    fn test_create_rejects_page_zero() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store.create(0, "nope").unwrap_err();
        assert!(matches!(err, StorageError::InvalidPage { page: 0 }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_all_newest_first() {
        let mut store = Store::open_in_memory().unwrap();

        store.create(42, "first created").unwrap();
        store.create(10, "second created").unwrap();

        let bookmarks = store.all().unwrap();
        assert_eq!(bookmarks.len(), 2);
        // Newest first: page 10 was created second
        assert_eq!(bookmarks[0].page_number, 10);
        assert_eq!(bookmarks[1].page_number, 42);
    }

    #[test]
    fn test_query_all_by_page() {
        let mut store = Store::open_in_memory().unwrap();

        store.create(300, "").unwrap();
        store.create(5, "").unwrap();
        store.create(42, "").unwrap();

        let asc = store.query_all(SortKey::PageNumber, false).unwrap();
        let pages: Vec<u32> = asc.iter().map(|b| b.page_number).collect();
        assert_eq!(pages, vec![5, 42, 300]);

        let desc = store.query_all(SortKey::PageNumber, true).unwrap();
        let pages: Vec<u32> = desc.iter().map(|b| b.page_number).collect();
        assert_eq!(pages, vec![300, 42, 5]);
    }

    #[test]
    fn test_delete() {
        let mut store = Store::open_in_memory().unwrap();

        let bookmark = store.create(42, "").unwrap();
        assert_eq!(store.count().unwrap(), 1);

        assert!(store.delete(bookmark.id).unwrap());
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get(bookmark.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut store = Store::open_in_memory().unwrap();

        let bookmark = store.create(42, "").unwrap();
        assert!(store.delete(bookmark.id).unwrap());

        // Second delete observes nothing to remove
        assert!(!store.delete(bookmark.id).unwrap());
        assert!(!store.delete(Uuid::new_v4()).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_is_page_bookmarked_lifecycle() {
        let mut store = Store::open_in_memory().unwrap();

        assert!(!store.is_page_bookmarked(42).unwrap());

        let bookmark = store.create(42, "note A").unwrap();
        assert!(store.is_page_bookmarked(42).unwrap());
        assert!(!store.is_page_bookmarked(43).unwrap());

        store.delete(bookmark.id).unwrap();
        assert!(!store.is_page_bookmarked(42).unwrap());
    }

    #[test]
    fn test_same_page_twice_allowed() {
        let mut store = Store::open_in_memory().unwrap();

        let first = store.create(42, "a").unwrap();
        let second = store.create(42, "b").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.count().unwrap(), 2);

        // Page stays bookmarked while one record remains
        store.delete(first.id).unwrap();
        assert!(store.is_page_bookmarked(42).unwrap());
        store.delete(second.id).unwrap();
        assert!(!store.is_page_bookmarked(42).unwrap());
    }

    #[test]
    fn test_subscribers_observe_committed_mutations() {
        let mut store = Store::open_in_memory().unwrap();

        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let _sub = store.subscribe(move |event| {
            let label = match event {
                StoreEvent::Created(b) => format!("created:{}", b.page_number),
                StoreEvent::Deleted(id) => format!("deleted:{}", id),
            };
            sink.lock().unwrap().push(label);
        });

        let bookmark = store.create(42, "").unwrap();
        store.delete(bookmark.id).unwrap();

        let seen = events.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["created:42".to_string(), format!("deleted:{}", bookmark.id)]
        );
    }

    #[test]
    fn test_delete_absent_fires_no_event() {
        let mut store = Store::open_in_memory().unwrap();

        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let _sub = store.subscribe(move |_| sink.lock().unwrap().push("event".to_string()));

        store.delete(Uuid::new_v4()).unwrap();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let mut store = Store::open_in_memory().unwrap();

        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let sub = store.subscribe(move |_| sink.lock().unwrap().push("event".to_string()));

        store.create(1, "").unwrap();
        assert_eq!(events.lock().unwrap().len(), 1);

        drop(sub);
        store.create(2, "").unwrap();
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_create_fires_no_event() {
        let mut store = Store::open_in_memory().unwrap();

        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let _sub = store.subscribe(move |_| sink.lock().unwrap().push("event".to_string()));

        assert!(store.create(0, "").is_err());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let id = {
            let mut store = Store::open(&config).unwrap();
            store.create(42, "persistent note").unwrap().id
        };

        let store = Store::open(&config).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        let bookmark = store.get(id).unwrap().unwrap();
        assert_eq!(bookmark.page_number, 42);
        assert_eq!(bookmark.details, "persistent note");
    }

    #[test]
    fn test_scenario_create_delete_walk() {
        // Full lifecycle: bookmark 42 "note A", then 10, then delete 10
        let mut store = Store::open_in_memory().unwrap();

        let forty_two = store.create(42, "note A").unwrap();
        let list = store.all().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].page_number, 42);
        assert_eq!(list[0].details, "note A");

        let ten = store.create(10, "").unwrap();
        let pages: Vec<u32> = store.all().unwrap().iter().map(|b| b.page_number).collect();
        assert_eq!(pages, vec![10, 42]);

        store.delete(ten.id).unwrap();
        let pages: Vec<u32> = store.all().unwrap().iter().map(|b| b.page_number).collect();
        assert_eq!(pages, vec![42]);
        assert!(!store.is_page_bookmarked(10).unwrap());
        assert!(store.is_page_bookmarked(forty_two.page_number).unwrap());
    }
}
