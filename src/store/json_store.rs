use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::store::kv::{KeyValueStore, StorageError, StorageResult};

/// File-backed key/value store: each key is one `<key>.json` document under
/// `base_dir`. Single writes go through a `.tmp` file and a rename.
pub struct JsonStore {
    base_dir: PathBuf,
}

fn io_err(key: &str, source: io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

fn write_synced(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

impl JsonStore {
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordbook")
    }

    pub fn with_base_dir(base_dir: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_dir).map_err(|e| io_err("<base dir>", e))?;
        let store = Self { base_dir };
        if store.recover_interrupted_commit() {
            warn!(
                dir = %store.base_dir.display(),
                "recovered files from an interrupted multi-key commit"
            );
        }
        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    /// Settle leftovers of a multi-key commit that died half way. A `.bak`
    /// whose document is missing is the only copy and is moved back into
    /// place; otherwise it is stale and removed. Staged `.tmp` files are
    /// always removed. Returns true if anything was found.
    pub fn recover_interrupted_commit(&self) -> bool {
        let Ok(entries) = fs::read_dir(&self.base_dir) else {
            return false;
        };
        let mut found = false;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let name = path.to_string_lossy();
            if let Some(final_name) = name.strip_suffix(".bak") {
                if !final_name.ends_with(".json") {
                    continue;
                }
                found = true;
                let final_path = PathBuf::from(final_name);
                if final_path.exists() {
                    let _ = fs::remove_file(&path);
                } else if let Err(e) = fs::rename(&path, &final_path) {
                    warn!(path = %path.display(), error = %e, "could not restore backup");
                }
            } else if name.ends_with(".json.tmp") {
                found = true;
                let _ = fs::remove_file(&path);
            }
        }
        found
    }
}

impl KeyValueStore for JsonStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.file_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key, e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");
        write_synced(&tmp_path, value).map_err(|e| io_err(key, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| io_err(key, e))?;
        debug!(key, bytes = value.len(), "wrote document");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key, e)),
        }
    }

    /// Two-phase commit with best-effort `.bak` rollback.
    ///
    /// Stage phase: write every value to a `.tmp` file; on failure remove the
    /// staged files and bail. Commit phase: per key, move the original to
    /// `.bak` and the `.tmp` into place; on failure restore the backups of
    /// everything committed so far. Backups are deleted once all keys land.
    fn set_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        let mut staged: Vec<PathBuf> = Vec::new();
        for (key, json) in entries {
            let tmp_path = self.file_path(key).with_extension("json.tmp");
            match write_synced(&tmp_path, json) {
                Ok(()) => staged.push(tmp_path),
                Err(e) => {
                    for tmp in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(StorageError::Import {
                        stage: "staging",
                        reason: format!("{key}: {e}"),
                    });
                }
            }
        }

        // (final_path, bak_path, had_original) so rollback can restore absence
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        let rollback = |committed: &[(PathBuf, PathBuf, bool)]| {
            for (final_path, bak_path, had_original) in committed {
                if *had_original {
                    let _ = fs::rename(bak_path, final_path);
                } else {
                    let _ = fs::remove_file(final_path);
                }
            }
        };

        for (i, (key, _)) in entries.iter().enumerate() {
            let final_path = self.file_path(key);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
                rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(StorageError::Import {
                    stage: "backup",
                    reason: format!("{key}: {e}"),
                });
            }

            if let Err(e) = fs::rename(&staged[i], &final_path) {
                if had_original && bak_path.exists() {
                    let _ = fs::rename(&bak_path, &final_path);
                } else {
                    let _ = fs::remove_file(&final_path);
                }
                rollback(&committed);
                for tmp in &staged[i + 1..] {
                    let _ = fs::remove_file(tmp);
                }
                return Err(StorageError::Import {
                    stage: "commit",
                    reason: format!("{key}: {e}"),
                });
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        debug!(keys = entries.len(), "committed multi-key write");
        Ok(())
    }
}
