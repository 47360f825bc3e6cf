//! # Rooster Directory
//! The persistent subscriber set, backed by SQLite.
//!
//! One table keyed by chat id. `add` is an upsert, `remove` is a silent
//! no-op on absent rows — both are idempotent by construction, so repeated
//! subscribe/unsubscribe commands and reconciler removals never corrupt
//! state. A second small table holds per-conversation auth state for the
//! subscribe flow.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::Connection;

use rooster_core::error::{Result, RoosterError};
use rooster_core::types::{AuthState, ChatId, Subscriber};

/// Persistent subscriber directory. Cheap to share behind an `Arc`; the
/// connection is serialized through a mutex, while per-recipient atomicity
/// comes from SQLite's own upsert/delete semantics.
pub struct Directory {
    conn: Mutex<Connection>,
}

impl Directory {
    /// Open (or create) the directory at the given path. Failure here is
    /// treated as fatal by the caller — storage must be reachable at boot.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::from_connection(conn)
    }

    /// In-memory directory, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS subscribers (
                chat_id INTEGER PRIMARY KEY,
                first_name TEXT,
                username TEXT,
                subscribed_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS conversations (
                chat_id INTEGER PRIMARY KEY,
                state TEXT NOT NULL
            );",
        )
        .map_err(storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Add a subscriber. Idempotent: a repeat add refreshes the display
    /// metadata and leaves exactly one row for the chat id.
    pub fn add(&self, subscriber: &Subscriber) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO subscribers (chat_id, first_name, username, subscribed_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(chat_id) DO UPDATE SET
                 first_name = excluded.first_name,
                 username = excluded.username",
            rusqlite::params![
                subscriber.chat_id.0,
                subscriber.first_name,
                subscriber.username,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;
        tracing::debug!("subscriber {} upserted", subscriber.chat_id);
        Ok(())
    }

    /// Remove a subscriber. Idempotent: removing an absent chat id succeeds.
    pub fn remove(&self, chat_id: ChatId) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM subscribers WHERE chat_id = ?1",
                rusqlite::params![chat_id.0],
            )
            .map_err(storage_err)?;
        if removed > 0 {
            tracing::debug!("subscriber {chat_id} removed");
        }
        Ok(())
    }

    /// Point-in-time snapshot of all subscribers. The set may change
    /// concurrently after this returns; callers must not assume stability.
    pub fn list_all(&self) -> Result<Vec<Subscriber>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT chat_id, first_name, username FROM subscribers")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Subscriber {
                    chat_id: ChatId(row.get(0)?),
                    first_name: row.get(1)?,
                    username: row.get(2)?,
                })
            })
            .map_err(storage_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage_err)
    }

    /// Number of subscribers.
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM subscribers", [], |r| {
            r.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(storage_err)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether a chat id is currently subscribed.
    pub fn contains(&self, chat_id: ChatId) -> Result<bool> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM subscribers WHERE chat_id = ?1",
            rusqlite::params![chat_id.0],
            |r| r.get::<_, i64>(0),
        )
        .map(|n| n > 0)
        .map_err(storage_err)
    }

    /// Current auth state of a conversation, if any.
    pub fn auth_state(&self, chat_id: ChatId) -> Result<Option<AuthState>> {
        let conn = self.lock()?;
        let state: Option<String> = conn
            .query_row(
                "SELECT state FROM conversations WHERE chat_id = ?1",
                rusqlite::params![chat_id.0],
                |r| r.get(0),
            )
            .ok();
        Ok(state.as_deref().and_then(AuthState::parse))
    }

    /// Record the auth state of a conversation (upsert).
    pub fn set_auth_state(&self, chat_id: ChatId, state: AuthState) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO conversations (chat_id, state) VALUES (?1, ?2)
             ON CONFLICT(chat_id) DO UPDATE SET state = excluded.state",
            rusqlite::params![chat_id.0, state.as_str()],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RoosterError::Storage(e.to_string()))
    }
}

fn storage_err(e: rusqlite::Error) -> RoosterError {
    RoosterError::Storage(e.to_string())
}
