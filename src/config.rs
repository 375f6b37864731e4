//! Where dataforge keeps its files. The data directory comes from the
//! `--data-dir` flag, then `DATAFORGE_HOME`, then `~/.dataforge`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".dataforge";
/// SQLite file holding the named snapshots.
const STORE_FILE_NAME: &str = "store.sqlite";
const LOG_FILE_NAME: &str = "dataforge.log";
/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "DATAFORGE_HOME";
/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "DATAFORGE_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    data_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the data directory, preferring an explicit override.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = data_dir {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::new(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/forge"))).unwrap();
        assert_eq!(config.data_dir(), Path::new("/tmp/forge"));
        assert_eq!(config.store_path(), PathBuf::from("/tmp/forge/store.sqlite"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/forge/dataforge.log"));
    }
}
