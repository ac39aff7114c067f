use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lifeline_types::SystemPulse;

use crate::backend::{FileBackend, KvBackend, MemoryBackend, SyncMode, DEFAULT_COMPACT_MIN_BYTES};
use crate::error::{StoreError, StoreResult};

/// Which backing store to open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    /// Volatile in-memory store.
    Memory,
    /// Durable log-structured store in the given directory.
    File {
        path: PathBuf,
        #[serde(default)]
        sync: SyncMode,
        /// Log size below which shadowed entries are never compacted away.
        #[serde(default = "default_compact_min_bytes")]
        compact_min_bytes: u64,
    },
}

fn default_compact_min_bytes() -> u64 {
    DEFAULT_COMPACT_MIN_BYTES
}

/// Configuration for [`LedgerStore::initialize`](crate::LedgerStore::initialize).
///
/// ```toml
/// pulse_period_secs = 10
///
/// [backend]
/// kind = "file"
/// path = "/var/lib/lifeline"
/// sync = "every-write"
/// compact_min_bytes = 1048576
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendConfig,
    /// Length of a wall-clock pulse in seconds.
    pub pulse_period_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::File {
                path: PathBuf::from("_db"),
                sync: SyncMode::default(),
                compact_min_bytes: DEFAULT_COMPACT_MIN_BYTES,
            },
            pulse_period_secs: SystemPulse::DEFAULT_PERIOD_SECS,
        }
    }
}

impl StoreConfig {
    /// A configuration backed by memory only.
    pub fn in_memory() -> Self {
        Self {
            backend: BackendConfig::Memory,
            ..Default::default()
        }
    }

    /// A file-backed configuration rooted at `path`.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::File {
                path: path.into(),
                sync: SyncMode::default(),
                compact_min_bytes: DEFAULT_COMPACT_MIN_BYTES,
            },
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Open the configured backend.
    pub fn open_backend(&self) -> StoreResult<Box<dyn KvBackend>> {
        match &self.backend {
            BackendConfig::Memory => Ok(Box::new(MemoryBackend::new())),
            BackendConfig::File {
                path,
                sync,
                compact_min_bytes,
            } => Ok(Box::new(FileBackend::open_with(
                path,
                *sync,
                *compact_min_bytes,
            )?)),
        }
    }

    /// Wall-clock pulse source with the configured period.
    pub fn pulse_source(&self) -> SystemPulse {
        SystemPulse::new(self.pulse_period_secs)
    }
}
