use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where uploaded objects are kept. Selected by `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3 or an S3-compatible service.
    S3,
    /// A directory served over HTTP.
    Local,
    /// Process memory; tests and dry runs only.
    Memory,
}

impl StorageBackend {
    pub const ALL: [StorageBackend; 3] =
        [StorageBackend::S3, StorageBackend::Local, StorageBackend::Memory];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
            StorageBackend::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StorageBackend::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown storage backend '{}' (s3, local, memory)", s))
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
