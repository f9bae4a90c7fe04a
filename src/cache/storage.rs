//! Item store trait and SQLite implementation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::observe::{Observer, Observers, Subscription};
use crate::catapi::types::CachedItem;

/// Trait for cached item storage backends.
///
/// Every mutating call commits atomically and then notifies observers with
/// the full new contents, in write order. Observers run while the store is
/// locked and must not call back into it.
pub trait ItemStore: Send + Sync {
  /// Register a live query. The observer receives the current contents
  /// immediately, then a fresh snapshot after every mutation.
  fn subscribe(&self, observer: Observer) -> Result<Subscription>;

  /// All items in insertion order.
  #[cfg(test)]
  fn all(&self) -> Result<Vec<CachedItem>>;

  /// Number of stored items.
  fn count(&self) -> Result<usize>;

  /// Upsert by `remote_id`. A replaced item keeps its original position.
  fn insert_or_replace(&self, items: &[CachedItem]) -> Result<()>;

  /// Remove every item.
  fn delete_all(&self) -> Result<()>;
}

/// SQLite-based item storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  observers: Observers,
}

/// Schema for the image cache.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cached_images (
    remote_id TEXT PRIMARY KEY,
    image_url TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    position INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cached_images_position ON cached_images(position);
"#;

impl SqliteStorage {
  /// Open the cache at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    debug!(path = %path.display(), "opened image cache");
    Self::with_connection(conn)
  }

  /// Open a throwaway in-memory cache.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
      observers: Observers::new(),
    })
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("catgrid").join("cache.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Notify observers with the contents visible through `conn`.
  fn publish(&self, conn: &Connection) -> Result<()> {
    let items = select_all(conn)?;
    self.observers.notify(&items);
    Ok(())
  }
}

fn select_all(conn: &Connection) -> Result<Vec<CachedItem>> {
  let mut stmt = conn
    .prepare_cached(
      "SELECT remote_id, image_url, title, description FROM cached_images
       ORDER BY position",
    )
    .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

  let items = stmt
    .query_map([], |row| {
      Ok(CachedItem {
        remote_id: row.get(0)?,
        image_url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
      })
    })
    .map_err(|e| eyre!("Failed to query cached images: {}", e))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(|e| eyre!("Failed to read cached image: {}", e))?;

  Ok(items)
}

impl ItemStore for SqliteStorage {
  fn subscribe(&self, observer: Observer) -> Result<Subscription> {
    // Hold the lock so no write can slip between the replay and registration.
    let conn = self.lock()?;
    let items = select_all(&conn)?;
    let subscription = self.observers.register(observer.clone());
    observer(items.as_slice());
    Ok(subscription)
  }

  #[cfg(test)]
  fn all(&self) -> Result<Vec<CachedItem>> {
    let conn = self.lock()?;
    select_all(&conn)
  }

  fn count(&self) -> Result<usize> {
    let conn = self.lock()?;
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM cached_images", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to count cached images: {}", e))?;
    Ok(count as usize)
  }

  fn insert_or_replace(&self, items: &[CachedItem]) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    {
      let mut stmt = tx
        .prepare_cached(
          "INSERT INTO cached_images (remote_id, image_url, title, description, position)
           VALUES (?1, ?2, ?3, ?4, (SELECT COALESCE(MAX(position), 0) + 1 FROM cached_images))
           ON CONFLICT(remote_id) DO UPDATE SET
             image_url = excluded.image_url,
             title = excluded.title,
             description = excluded.description",
        )
        .map_err(|e| eyre!("Failed to prepare upsert: {}", e))?;

      for item in items {
        stmt
          .execute(params![
            item.remote_id,
            item.image_url,
            item.title,
            item.description
          ])
          .map_err(|e| eyre!("Failed to store image {}: {}", item.remote_id, e))?;
      }
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(count = items.len(), "stored images");
    self.publish(&conn)
  }

  fn delete_all(&self) -> Result<()> {
    let conn = self.lock()?;
    let removed = conn
      .execute("DELETE FROM cached_images", [])
      .map_err(|e| eyre!("Failed to clear image cache: {}", e))?;

    debug!(removed, "cleared image cache");
    self.publish(&conn)
  }
}
