//! Storage layer for templates and their versions.
//!
//! Every template is persisted as individual JSON records in a single
//! directory:
//!
//! - `<name>.json` is the latest pointer, a copy of the newest version;
//! - `<name>_v<N>.json` is version `N`, immutable once written.
//!
//! The directory is created lazily on the first write. Reading from a
//! directory that does not exist behaves like reading an empty store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

use crate::error::{Result, StoreError};
use crate::template::{Template, split_version_suffix};

const RECORD_EXTENSION: &str = "json";

/// Persistence operations the version chain is built on.
pub trait TemplateStorage {
    /// Write or overwrite the latest pointer for `template.name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn put_latest(&self, template: &Template) -> Result<()>;

    /// Write the immutable record for `(template.name, template.version)`.
    ///
    /// Writing a record identical to the one already stored succeeds
    /// without touching it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionConflict`] if a different record already
    /// holds this version.
    fn put_version(&self, template: &Template) -> Result<()>;

    /// Load the latest pointer for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no pointer exists.
    fn get_latest(&self, name: &str) -> Result<Template>;

    /// Load a specific version of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionNotFound`] if the version does not exist.
    fn get_version(&self, name: &str, version: u32) -> Result<Template>;

    /// All latest pointers, in no particular order. Unreadable records are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    fn list_latest(&self) -> Result<impl Iterator<Item = Template> + '_>;

    /// Version numbers stored for `name`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    fn list_versions(&self, name: &str) -> Result<impl Iterator<Item = u32> + '_>;

    /// Name of every record, latest pointers and versions alike. Names repeat
    /// once per record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    fn list_names(&self) -> Result<impl Iterator<Item = String> + '_>;

    /// Remove the latest pointer and every version record of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record matched.
    fn delete_all(&self, name: &str) -> Result<DeleteReport>;

    /// Whether any record exists for `name`.
    fn exists(&self, name: &str) -> bool;
}

/// Outcome of removing every record of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Records that were removed.
    pub removed: Vec<PathBuf>,
    /// Records that could not be removed.
    pub failed: Vec<FailedRemoval>,
}

impl DeleteReport {
    /// Whether some records survived the deletion.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Number of records that were removed.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// A record that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRemoval {
    /// Path of the surviving record.
    pub path: PathBuf,
    /// Why removal failed.
    pub error: String,
}

/// Which record a file in the store holds.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordKey {
    Latest(String),
    Version(String, u32),
}

impl RecordKey {
    fn from_path(path: &Path) -> Option<Self> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        Some(match split_version_suffix(stem) {
            Some((name, version)) => Self::Version(name.to_string(), version),
            None => Self::Latest(stem.to_string()),
        })
    }

    fn name(&self) -> &str {
        match self {
            Self::Latest(name) | Self::Version(name, _) => name,
        }
    }
}

/// Filesystem-backed template store.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until the
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the records.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the latest pointer for `name`.
    #[must_use]
    pub fn latest_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{RECORD_EXTENSION}"))
    }

    /// Path of version `version` of `name`.
    #[must_use]
    pub fn version_path(&self, name: &str, version: u32) -> PathBuf {
        self.root
            .join(format!("{name}_v{version}.{RECORD_EXTENSION}"))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Write a record through a temporary file in the same directory, so
    /// readers never observe a half-written record.
    fn write_record(&self, path: &Path, template: &Template, overwrite: bool) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(template)?;

        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;

        if overwrite {
            file.persist(path).map_err(|e| e.error)?;
        } else {
            file.persist_noclobber(path).map_err(|e| e.error)?;
        }
        debug!("Wrote record {}", path.display());
        Ok(())
    }

    fn records(&self) -> Result<impl Iterator<Item = (PathBuf, RecordKey)> + use<>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(entries.into_iter().flatten().filter_map(|entry| {
            let entry = entry
                .map_err(|e| warn!(error = %e, "Skipping unreadable directory entry"))
                .ok()?;
            let path = entry.path();
            if !path.is_file() {
                return None;
            }
            let key = RecordKey::from_path(&path)?;
            Some((path, key))
        }))
    }
}

/// Read a record, mapping a missing file to `None`.
fn read_record(path: &Path) -> Result<Option<Template>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

impl TemplateStorage for FsStore {
    #[instrument(skip(self, template), fields(name = %template.name, version = template.version))]
    fn put_latest(&self, template: &Template) -> Result<()> {
        self.write_record(&self.latest_path(&template.name), template, true)
    }

    #[instrument(skip(self, template), fields(name = %template.name, version = template.version))]
    fn put_version(&self, template: &Template) -> Result<()> {
        let path = self.version_path(&template.name, template.version);
        match self.write_record(&path, template, false) {
            Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                match read_record(&path)? {
                    Some(existing) if existing == *template => {
                        debug!("Identical version record already present");
                        Ok(())
                    }
                    _ => Err(StoreError::VersionConflict {
                        name: template.name.clone(),
                        version: template.version,
                    }),
                }
            }
            other => other,
        }
    }

    fn get_latest(&self, name: &str) -> Result<Template> {
        read_record(&self.latest_path(name))?.ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn get_version(&self, name: &str, version: u32) -> Result<Template> {
        read_record(&self.version_path(name, version))?.ok_or_else(|| {
            StoreError::VersionNotFound {
                name: name.to_string(),
                version,
            }
        })
    }

    fn list_latest(&self) -> Result<impl Iterator<Item = Template> + '_> {
        Ok(self.records()?.filter_map(|(path, key)| {
            if !matches!(key, RecordKey::Latest(_)) {
                return None;
            }
            match read_record(&path) {
                Ok(template) => template,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable template record");
                    None
                }
            }
        }))
    }

    fn list_versions(&self, name: &str) -> Result<impl Iterator<Item = u32> + '_> {
        let name = name.to_string();
        Ok(self.records()?.filter_map(move |(_, key)| match key {
            RecordKey::Version(record_name, version) if record_name == name => Some(version),
            _ => None,
        }))
    }

    fn list_names(&self) -> Result<impl Iterator<Item = String> + '_> {
        Ok(self.records()?.map(|(_, key)| key.name().to_string()))
    }

    #[instrument(skip(self))]
    fn delete_all(&self, name: &str) -> Result<DeleteReport> {
        let mut report = DeleteReport::default();

        for (path, key) in self.records()? {
            if key.name() != name {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove record");
                    report.failed.push(FailedRemoval {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.removed.is_empty() && report.failed.is_empty() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(report)
    }

    fn exists(&self, name: &str) -> bool {
        if self.latest_path(name).is_file() {
            return true;
        }
        self.list_versions(name)
            .map(|mut versions| versions.next().is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("templates"));
        (dir, store)
    }

    #[test]
    fn test_record_key_from_path() {
        assert_eq!(
            RecordKey::from_path(Path::new("/t/sum.json")),
            Some(RecordKey::Latest("sum".to_string()))
        );
        assert_eq!(
            RecordKey::from_path(Path::new("/t/sum_v12.json")),
            Some(RecordKey::Version("sum".to_string(), 12))
        );
        assert_eq!(RecordKey::from_path(Path::new("/t/history.log")), None);
        assert_eq!(RecordKey::from_path(Path::new("/t/.tmpA1b2C3")), None);
    }

    #[test]
    fn test_directory_created_lazily() {
        let (_dir, store) = store();
        assert!(!store.root().exists());
        assert_eq!(store.list_latest().unwrap().count(), 0);
        assert!(!store.root().exists());

        store.put_latest(&Template::first("a", "x")).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_put_and_get() {
        let (_dir, store) = store();
        let template = Template::first("sum", "Q: <input>");
        store.put_version(&template).unwrap();
        store.put_latest(&template).unwrap();

        assert_eq!(store.get_latest("sum").unwrap(), template);
        assert_eq!(store.get_version("sum", 1).unwrap(), template);
        assert!(store.latest_path("sum").is_file());
        assert!(store.version_path("sum", 1).is_file());
    }

    #[test]
    fn test_get_missing() {
        let (_dir, store) = store();
        assert!(matches!(store.get_latest("nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.get_version("nope", 3),
            Err(StoreError::VersionNotFound { version: 3, .. })
        ));
    }

    #[test]
    fn test_put_version_never_overwrites() {
        let (_dir, store) = store();
        let original = Template::first("sum", "one");
        store.put_version(&original).unwrap();

        // Same record again is accepted.
        store.put_version(&original).unwrap();

        let result = store.put_version(&Template::first("sum", "two"));
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { version: 1, .. })
        ));
        assert_eq!(store.get_version("sum", 1).unwrap().content, "one");
    }

    #[test]
    fn test_list_latest_skips_malformed() {
        let (_dir, store) = store();
        store.put_latest(&Template::first("good", "x")).unwrap();
        store.put_version(&Template::first("good", "x")).unwrap();
        fs::write(store.latest_path("broken"), "{ not json").unwrap();
        fs::write(store.root().join("notes.txt"), "ignored").unwrap();

        let names: Vec<String> = store.list_latest().unwrap().map(|t| t.name).collect();
        assert_eq!(names, vec!["good".to_string()]);
    }

    #[test]
    fn test_list_versions_exact_name() {
        let (_dir, store) = store();
        let sum = Template::first("sum", "a");
        store.put_version(&sum).unwrap();
        store.put_version(&sum.next("b").unwrap()).unwrap();
        store.put_version(&Template::first("summary", "c")).unwrap();

        let mut versions: Vec<u32> = store.list_versions("sum").unwrap().collect();
        versions.sort_unstable();
        assert_eq!(versions, vec![1, 2]);
    }

    #[test]
    fn test_delete_all_is_exact() {
        let (_dir, store) = store();
        let sum = Template::first("sum", "a");
        let sum2 = sum.next("b").unwrap();
        store.put_version(&sum).unwrap();
        store.put_version(&sum2).unwrap();
        store.put_latest(&sum2).unwrap();
        let other = Template::first("summary", "c");
        store.put_version(&other).unwrap();
        store.put_latest(&other).unwrap();

        let report = store.delete_all("sum").unwrap();
        assert_eq!(report.removed_count(), 3);
        assert!(!report.is_partial());

        assert!(!store.exists("sum"));
        assert!(store.exists("summary"));
        assert!(matches!(store.delete_all("sum"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_exists_with_only_versions() {
        let (_dir, store) = store();
        assert!(!store.exists("sum"));
        store.put_version(&Template::first("sum", "a")).unwrap();
        assert!(store.exists("sum"));
    }

    #[test]
    fn test_corrupt_latest_is_reported() {
        let (_dir, store) = store();
        fs::create_dir_all(store.root()).unwrap();
        fs::write(store.latest_path("bad"), "[]").unwrap();
        assert!(matches!(store.get_latest("bad"), Err(StoreError::Corrupt { .. })));
    }
}
