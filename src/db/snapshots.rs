use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::connection::ensure_schema;
use super::SnapshotStore;
use crate::error::{ForgeError, Result};

/// Snapshot store backed by a single SQLite file. Each named snapshot is one
/// row whose `data` column holds the snapshot database bytes.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: ensure_schema(path)?,
        })
    }
}

impl SnapshotStore for SqliteStore {
    fn save(&self, name: &str, blob: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO snapshots (name, data) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET data = excluded.data, saved_at = CURRENT_TIMESTAMP",
            params![name, blob],
        )?;
        debug!(name, bytes = blob.len(), "stored snapshot");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Vec<u8>> {
        self.conn
            .query_row(
                "SELECT data FROM snapshots WHERE name = ?1",
                params![name],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .ok_or_else(|| ForgeError::NotFound(format!("file not found: {name}")))
    }

    fn delete(&self, name: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM snapshots WHERE name = ?1", params![name])?;

        if deleted == 0 {
            Err(ForgeError::NotFound(format!("file not found: {name}")))
        } else {
            Ok(())
        }
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM snapshots ORDER BY name")?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_load_overwrite_delete() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("nested").join("store.sqlite")).unwrap();

        store.save("b", b"one").unwrap();
        store.save("a", b"two").unwrap();
        store.save("b", b"three").unwrap();

        assert_eq!(store.list_names().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.load("b").unwrap(), b"three".to_vec());

        store.delete("a").unwrap();
        assert_eq!(store.list_names().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn missing_names_are_not_found() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("store.sqlite")).unwrap();

        assert!(matches!(store.load(""), Err(ForgeError::NotFound(_))));
        assert!(matches!(store.delete("ghost"), Err(ForgeError::NotFound(_))));
    }
}
