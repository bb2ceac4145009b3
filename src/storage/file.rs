use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use blake3::Hasher as Blake3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::{PayError, PayResult};
use crate::storage::KvStore;

const STORE_VERSION: u16 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreEnvelope {
    version: u16,
    checksum: [u8; 32],
    entries: BTreeMap<String, String>,
}

/// Durable key-value tier backed by a single JSON file with an integrity
/// checksum. Writes go through a temp file and an atomic rename.
///
/// A malformed or tampered file is not fatal: the store starts empty and
/// the fallback is logged, never silently swallowed.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!(
                    "store at {} is unreadable ({}); starting from an empty state",
                    path.display(),
                    err
                );
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> PayResult<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = fs::read(path)?;
        let envelope: StoreEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != STORE_VERSION {
            return Err(PayError::ValidationError(format!(
                "Unsupported store version {}",
                envelope.version
            )));
        }

        if checksum(&envelope.entries)? != envelope.checksum {
            return Err(PayError::ValidationError(
                "Store integrity verification failed".to_string(),
            ));
        }

        Ok(envelope.entries)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> PayResult<()> {
        let envelope = StoreEnvelope {
            version: STORE_VERSION,
            checksum: checksum(entries)?,
            entries: entries.clone(),
        };

        let serialized = serde_json::to_vec_pretty(&envelope)?;
        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PayResult<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> PayResult<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

fn checksum(entries: &BTreeMap<String, String>) -> PayResult<[u8; 32]> {
    let mut hasher = Blake3::new();
    let encoded = serde_json::to_vec(entries)?;
    hasher.update(&encoded);
    let mut output = [0u8; 32];
    output.copy_from_slice(hasher.finalize().as_bytes());
    Ok(output)
}
