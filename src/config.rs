//! Runtime configuration loaded from environment variables.
//!
//! - `TASKBOARD_KV_URL` - key-value server to persist to (wins over the file)
//! - `TASKBOARD_FILE` - CSV snapshot path (default: platform data directory)
//! - `TASKBOARD_YEAR` - calendar year of the schedule grid (default: current)
//! - `TASKBOARD_HISTORY_LIMIT` - keep at most this many history entries

use std::path::PathBuf;

use anyhow::Context;
use taskboard_core::ManagerConfig;

use crate::kv::KvClient;
use crate::persist::{Backend, FileStore, KvStore};

pub const ENV_FILE: &str = "TASKBOARD_FILE";
pub const ENV_KV_URL: &str = "TASKBOARD_KV_URL";
pub const ENV_YEAR: &str = "TASKBOARD_YEAR";
pub const ENV_HISTORY_LIMIT: &str = "TASKBOARD_HISTORY_LIMIT";

const DATA_FILE: &str = "taskboard.csv";

/// Where the board is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Memory,
    File(PathBuf),
    Kv(String),
}

impl Storage {
    /// Builds the backend; a key-value URL is registered with first.
    pub async fn connect(&self) -> anyhow::Result<Backend> {
        Ok(match self {
            Self::Memory => Backend::Memory,
            Self::File(path) => Backend::File(FileStore::new(path)),
            Self::Kv(url) => {
                let client = KvClient::connect(url.as_str())
                    .await
                    .with_context(|| format!("registering with key-value server at {url}"))?;
                Backend::Kv(KvStore::new(client))
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: Storage,
    pub manager: ManagerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage = if let Some(url) = var(ENV_KV_URL) {
            Storage::Kv(url)
        } else if let Some(path) = var(ENV_FILE) {
            Storage::File(PathBuf::from(path))
        } else {
            match default_data_file() {
                Some(path) => Storage::File(path),
                None => {
                    tracing::warn!("Could not determine data directory, keeping the board in memory");
                    Storage::Memory
                }
            }
        };

        let mut manager = ManagerConfig::default();
        if let Some(year) = var(ENV_YEAR) {
            manager.year = year
                .trim()
                .parse()
                .with_context(|| format!("{ENV_YEAR} is not a year: {year:?}"))?;
        }
        if let Some(limit) = var(ENV_HISTORY_LIMIT) {
            let limit: usize = limit
                .trim()
                .parse()
                .with_context(|| format!("{ENV_HISTORY_LIMIT} is not a count: {limit:?}"))?;
            manager = manager.with_history_limit(limit);
        }

        Ok(Self { storage, manager })
    }
}

/// `taskboard.csv` in the platform data directory.
pub fn default_data_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "taskboard")?;
    Some(dirs.data_dir().join(DATA_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn kv_url_wins_over_file() {
        let config = config(&[(ENV_FILE, "/tmp/a.csv"), (ENV_KV_URL, "http://localhost:8078")]).unwrap();
        assert_eq!(config.storage, Storage::Kv("http://localhost:8078".into()));
    }

    #[test]
    fn file_path_is_taken_verbatim() {
        let config = config(&[(ENV_FILE, "/tmp/board.csv")]).unwrap();
        assert_eq!(config.storage, Storage::File("/tmp/board.csv".into()));
    }

    #[test]
    fn year_and_history_limit_are_parsed() {
        let config = config(&[(ENV_YEAR, "2031"), (ENV_HISTORY_LIMIT, "10")]).unwrap();
        assert_eq!(config.manager.year, 2031);
        assert_eq!(config.manager.history_limit, Some(10));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config(&[(ENV_KV_URL, "  "), (ENV_FILE, "/tmp/x.csv")]).unwrap();
        assert_eq!(config.storage, Storage::File("/tmp/x.csv".into()));
    }

    #[test]
    fn rejects_a_bad_year() {
        assert!(config(&[(ENV_YEAR, "next")]).is_err());
    }
}
