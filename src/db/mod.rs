//! Named snapshot persistence.

mod connection;
mod snapshots;

pub use connection::ensure_schema;
pub use snapshots::SqliteStore;

use crate::error::Result;

/// Durable name -> blob storage. Names are the only identity; saving under an
/// existing name overwrites it.
pub trait SnapshotStore {
    fn save(&self, name: &str, blob: &[u8]) -> Result<()>;
    fn load(&self, name: &str) -> Result<Vec<u8>>;
    fn delete(&self, name: &str) -> Result<()>;
    /// Stored names in sorted order.
    fn list_names(&self) -> Result<Vec<String>>;
}
