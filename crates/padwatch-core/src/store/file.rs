// ── File-backed debounce store ──
//
// Layout: `{root}/{condition}/{encoded device name}.json`, one document
// per key. Writes go to a sibling `.tmp` file that is fsynced and renamed
// over the target, so a record is either the old one or the new one even
// if the process dies mid-write.

use std::fmt::Write as _;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, trace};

use super::{DebounceStore, StoreError};
use crate::model::{ConditionKind, DebounceKey, DebounceRecord};

const EXTENSION: &str = "json";

/// On-disk document. Carries its own key so listings never depend on
/// decoding file names.
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    device: String,
    condition: ConditionKind,
    occurrence_count: u32,
    remediated: bool,
    updated_at: DateTime<Utc>,
}

/// Durable store with one JSON file per `(device, condition)`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &DebounceKey) -> PathBuf {
        self.root
            .join(key.condition.as_ref())
            .join(format!("{}.{EXTENSION}", encode_name(&key.device)))
    }

    fn read_document(path: &Path) -> Result<Option<StoredRecord>, StoreError> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.to_owned(),
                message: e.to_string(),
            })
    }
}

impl DebounceStore for FileStore {
    fn get(&self, key: &DebounceKey) -> Result<Option<DebounceRecord>, StoreError> {
        let path = self.path_for(key);
        let Some(doc) = Self::read_document(&path)? else {
            return Ok(None);
        };
        if doc.device != key.device || doc.condition != key.condition {
            return Err(StoreError::Corrupt {
                path,
                message: format!("document belongs to {}/{}", doc.device, doc.condition),
            });
        }
        trace!(%key, count = doc.occurrence_count, "loaded debounce record");
        Ok(Some(DebounceRecord {
            occurrence_count: doc.occurrence_count,
            remediated: doc.remediated,
        }))
    }

    fn put(&self, key: &DebounceKey, record: DebounceRecord) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let doc = StoredRecord {
            device: key.device.clone(),
            condition: key.condition,
            occurrence_count: record.occurrence_count,
            remediated: record.remediated,
            updated_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&doc).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&path, &bytes).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(%key, count = record.occurrence_count, remediated = record.remediated, "stored debounce record");
        Ok(())
    }

    fn clear(&self, key: &DebounceKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(%key, "cleared debounce record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn entries(&self) -> Result<Vec<(DebounceKey, DebounceRecord)>, StoreError> {
        let mut out = Vec::new();
        for condition in ConditionKind::iter() {
            let dir = self.root.join(condition.as_ref());
            let listing = match std::fs::read_dir(&dir) {
                Ok(listing) => listing,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(StoreError::Io { path: dir, source }),
            };
            for entry in listing {
                let entry = entry.map_err(|source| StoreError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                if let Some(doc) = Self::read_document(&path)? {
                    out.push((
                        DebounceKey::new(doc.device, doc.condition),
                        DebounceRecord {
                            occurrence_count: doc.occurrence_count,
                            remediated: doc.remediated,
                        },
                    ));
                }
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

/// Map a device name onto a portable file stem: ASCII alphanumerics, `-`
/// and `_` pass through, a non-leading `.` passes through, everything else
/// becomes `%XX`.
fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, b) in name.bytes().enumerate() {
        let passthrough =
            b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || (b == b'.' && i > 0);
        if passthrough {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("state")).unwrap();
        (dir, store)
    }

    #[test]
    fn records_survive_reopen() {
        let (dir, store) = store();
        let key = DebounceKey::new("LP-01", ConditionKind::NoHub);
        let record = DebounceRecord::first().advanced().mark_remediated();
        store.put(&key, record).unwrap();

        let reopened = FileStore::open(dir.path().join("state")).unwrap();
        assert_eq!(reopened.get(&key).unwrap(), Some(record));
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let (_dir, store) = store();
        let key = DebounceKey::new("LP-01", ConditionKind::NoDevices);
        store.put(&key, DebounceRecord::first()).unwrap();
        assert!(store.path_for(&key).exists());

        store.clear(&key).unwrap();
        assert!(!store.path_for(&key).exists());
        store.clear(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn awkward_names_stay_inside_the_store() {
        let (_dir, store) = store();
        let key = DebounceKey::new("../Lobby / North", ConditionKind::NoHub);
        store.put(&key, DebounceRecord::first()).unwrap();

        let path = store.path_for(&key);
        assert!(path.starts_with(store.root()));
        assert_eq!(store.get(&key).unwrap(), Some(DebounceRecord::first()));

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.device, "../Lobby / North");
    }

    #[test]
    fn entries_lists_all_conditions_sorted() {
        let (_dir, store) = store();
        store
            .put(
                &DebounceKey::new("LP-02", ConditionKind::NoHub),
                DebounceRecord::first(),
            )
            .unwrap();
        store
            .put(
                &DebounceKey::new("LP-01", ConditionKind::NoDevices),
                DebounceRecord::first().advanced(),
            )
            .unwrap();

        let keys: Vec<_> = store
            .entries()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["LP-01/no-devices", "LP-02/no-hub"]);
    }

    #[test]
    fn corrupt_document_is_reported() {
        let (_dir, store) = store();
        let key = DebounceKey::new("LP-01", ConditionKind::NoHub);
        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        assert!(matches!(store.get(&key), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let (_dir, store) = store();
        let key = DebounceKey::new("LP-01", ConditionKind::NoHub);
        store.put(&key, DebounceRecord::first()).unwrap();
        store.put(&key, DebounceRecord::first().advanced()).unwrap();

        let dir = store.path_for(&key).parent().unwrap().to_owned();
        let names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["LP-01.json"]);
    }

    #[test]
    fn encoding_escapes_separators() {
        assert_eq!(encode_name("LP-01"), "LP-01");
        assert_eq!(encode_name("a/b"), "a%2Fb");
        assert_eq!(encode_name(".hidden"), "%2Ehidden");
        assert_eq!(encode_name("v1.2"), "v1.2");
    }
}
