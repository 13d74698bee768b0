//! Version chain manager.
//!
//! Enforces the create/update/delete contract on top of a
//! [`TemplateStorage`]. Version records are the source of truth; the latest
//! pointer is a cache of the newest version and is reconciled against the
//! version records whenever a template is loaded.

use tracing::{debug, instrument, warn};

use crate::error::{Result, StoreError};
use crate::store::{DeleteReport, FsStore, TemplateStorage};
use crate::template::{Template, TemplateSummary, validate_name};

/// Result of a create or update.
#[derive(Debug)]
pub struct Saved {
    /// The version that was written.
    pub template: Template,
    /// Set when the version was written but the latest pointer was not.
    pub pointer_error: Option<StoreError>,
}

impl Saved {
    /// Whether the latest pointer reflects the new version.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.pointer_error.is_none()
    }
}

/// Outcome of checking a latest pointer against the version records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Pointer already matches the newest version.
    Consistent {
        /// Newest version.
        version: u32,
    },
    /// Pointer was missing or stale and has been rewritten.
    Repaired {
        /// Version the pointer claimed, if it was readable.
        from: Option<u32>,
        /// Version the pointer now holds.
        to: u32,
    },
}

/// Manager for named, versioned templates.
#[derive(Debug, Clone)]
pub struct TemplateManager<S = FsStore> {
    storage: S,
}

impl<S: TemplateStorage> TemplateManager<S> {
    /// Create a manager over `storage`.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether a template with this name exists.
    pub fn exists(&self, name: &str) -> bool {
        self.storage.exists(name)
    }

    /// Create version 1 of a new template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the name is taken, or an error
    /// if version 1 cannot be written. A failed pointer write is reported in
    /// [`Saved::pointer_error`] instead.
    #[instrument(skip(self, content))]
    pub fn create(&self, name: &str, content: &str) -> Result<Saved> {
        validate_name(name)?;
        if self.storage.exists(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        self.write(Template::first(name, content))
    }

    /// Append a new version with `content`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the template does not exist, or an
    /// error if the new version cannot be written.
    #[instrument(skip(self, content))]
    pub fn update(&self, name: &str, content: &str) -> Result<Saved> {
        validate_name(name)?;
        let (latest, _) = self.resolve_latest(name)?;
        self.write(latest.next(content)?)
    }

    /// Remove every record of a template. Records that could not be removed
    /// are listed in the report; nothing is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record exists.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<DeleteReport> {
        validate_name(name)?;
        let report = self.storage.delete_all(name)?;
        if report.is_partial() {
            warn!(
                removed = report.removed_count(),
                failed = report.failed.len(),
                "Template only partially deleted"
            );
        }
        Ok(report)
    }

    /// Name and newest version of every template, sorted by name.
    ///
    /// Versions are resolved like [`TemplateManager::get`], so a template
    /// with a missing or stale pointer is still listed at its newest version.
    /// Nothing is written. Templates whose records cannot be read are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    pub fn list_all(&self) -> Result<Vec<TemplateSummary>> {
        let summaries = self
            .names()?
            .into_iter()
            .filter_map(|name| match self.resolve_latest(&name) {
                Ok((template, _)) => Some(template.summary()),
                Err(e) => {
                    warn!(%name, error = %e, "Skipping unreadable template");
                    None
                }
            })
            .collect();
        Ok(summaries)
    }

    /// Every template with at least one record, including templates whose
    /// latest pointer is missing. Sorted and unique.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.storage.list_names()?.collect();
        names.sort_unstable();
        names.dedup();
        Ok(names)
    }

    /// Stored version numbers of `name`, ascending. Empty if the template is
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    pub fn list_versions(&self, name: &str) -> Result<Vec<u32>> {
        validate_name(name)?;
        let mut versions: Vec<u32> = self.storage.list_versions(name)?.collect();
        versions.sort_unstable();
        versions.dedup();
        Ok(versions)
    }

    /// Load the newest version of a template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the template does not exist.
    #[instrument(skip(self))]
    pub fn get(&self, name: &str) -> Result<Template> {
        validate_name(name)?;
        let (template, state) = self.resolve_latest(name)?;
        if let Reconciliation::Repaired { .. } = state
            && let Err(e) = self.storage.put_latest(&template)
        {
            warn!(error = %e, "Could not repair latest pointer");
        }
        Ok(template)
    }

    /// Load a specific version of a template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionNotFound`] if that version does not exist.
    pub fn get_version(&self, name: &str, version: u32) -> Result<Template> {
        validate_name(name)?;
        self.storage.get_version(name, version)
    }

    /// Rebuild the latest pointer from the version records if it is missing
    /// or stale.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the template does not exist, or an
    /// error if the repaired pointer cannot be written.
    #[instrument(skip(self))]
    pub fn reconcile(&self, name: &str) -> Result<Reconciliation> {
        validate_name(name)?;
        let (newest, state) = self.resolve_latest(name)?;
        if let Reconciliation::Repaired { .. } = state {
            self.storage.put_latest(&newest)?;
        }
        Ok(state)
    }

    /// Write a version record, then the latest pointer.
    fn write(&self, template: Template) -> Result<Saved> {
        self.storage.put_version(&template)?;

        let pointer_error = self.storage.put_latest(&template).err();
        if let Some(ref e) = pointer_error {
            warn!(
                name = %template.name,
                version = template.version,
                error = %e,
                "Version saved but latest pointer could not be updated"
            );
        } else {
            debug!(name = %template.name, version = template.version, "Template saved");
        }

        Ok(Saved {
            template,
            pointer_error,
        })
    }

    /// Find the newest version of `name`, trusting version records over the
    /// latest pointer. Nothing is written.
    fn resolve_latest(&self, name: &str) -> Result<(Template, Reconciliation)> {
        let (pointer, pointer_error) = match self.storage.get_latest(name) {
            Ok(template) => (Some(template), None),
            Err(StoreError::NotFound(_)) => (None, None),
            Err(e) => {
                warn!(error = %e, "Latest pointer unreadable, falling back to version records");
                (None, Some(e))
            }
        };
        let newest_version = self.storage.list_versions(name)?.max();

        match (pointer, newest_version) {
            (None, None) => {
                Err(pointer_error.unwrap_or_else(|| StoreError::NotFound(name.to_string())))
            }
            (Some(pointer), None) => {
                warn!(version = pointer.version, "Latest pointer has no version records");
                let version = pointer.version;
                Ok((pointer, Reconciliation::Consistent { version }))
            }
            (Some(pointer), Some(newest)) if pointer.version >= newest => {
                if pointer.version > newest {
                    warn!(
                        pointer = pointer.version,
                        newest = newest,
                        "Latest pointer is ahead of the version records"
                    );
                }
                let version = pointer.version;
                Ok((pointer, Reconciliation::Consistent { version }))
            }
            (pointer, Some(newest)) => {
                let from = pointer.map(|p| p.version);
                warn!(?from, to = newest, "Latest pointer is stale, using newest version record");
                let template = self.storage.get_version(name, newest)?;
                Ok((template, Reconciliation::Repaired { from, to: newest }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use super::*;
    use crate::store::FailedRemoval;

    fn manager() -> (tempfile::TempDir, TemplateManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = TemplateManager::new(FsStore::new(dir.path().join("templates")));
        (dir, manager)
    }

    /// Storage whose latest-pointer writes can be made to fail, and which
    /// can refuse to remove one version record.
    struct FlakyStore {
        inner: FsStore,
        fail_latest: Cell<bool>,
        stuck_version: Cell<Option<u32>>,
    }

    impl FlakyStore {
        fn new(root: &std::path::Path) -> Self {
            Self {
                inner: FsStore::new(root),
                fail_latest: Cell::new(false),
                stuck_version: Cell::new(None),
            }
        }
    }

    impl TemplateStorage for FlakyStore {
        fn put_latest(&self, template: &Template) -> Result<()> {
            if self.fail_latest.get() {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.put_latest(template)
        }
        fn put_version(&self, template: &Template) -> Result<()> {
            self.inner.put_version(template)
        }
        fn get_latest(&self, name: &str) -> Result<Template> {
            self.inner.get_latest(name)
        }
        fn get_version(&self, name: &str, version: u32) -> Result<Template> {
            self.inner.get_version(name, version)
        }
        fn list_latest(&self) -> Result<impl Iterator<Item = Template> + '_> {
            self.inner.list_latest()
        }
        fn list_versions(&self, name: &str) -> Result<impl Iterator<Item = u32> + '_> {
            self.inner.list_versions(name)
        }
        fn list_names(&self) -> Result<impl Iterator<Item = String> + '_> {
            self.inner.list_names()
        }
        fn delete_all(&self, name: &str) -> Result<DeleteReport> {
            let Some(version) = self.stuck_version.get() else {
                return self.inner.delete_all(name);
            };
            let kept = self.inner.get_version(name, version)?;
            let mut report = self.inner.delete_all(name)?;
            self.inner.put_version(&kept)?;

            let path = self.inner.version_path(name, version);
            report.removed.retain(|p| *p != path);
            report.failed.push(FailedRemoval {
                path,
                error: "Permission denied".to_string(),
            });
            Ok(report)
        }
        fn exists(&self, name: &str) -> bool {
            self.inner.exists(name)
        }
    }

    #[test]
    fn test_create_starts_at_version_one() {
        let (_dir, manager) = manager();
        let saved = manager.create("sum", "Q: <input>").unwrap();
        assert!(saved.is_consistent());
        assert_eq!(saved.template.version, 1);
        assert_eq!(manager.get("sum").unwrap().version, 1);
        assert_eq!(manager.list_versions("sum").unwrap(), vec![1]);
    }

    #[test]
    fn test_updates_extend_the_chain() {
        let (_dir, manager) = manager();
        manager.create("sum", "v1").unwrap();
        for n in 2..=6 {
            let saved = manager.update("sum", &format!("v{n}")).unwrap();
            assert_eq!(saved.template.version, n);
        }

        let latest = manager.get("sum").unwrap();
        assert_eq!(latest.version, 6);
        assert_eq!(latest.content, "v6");
        assert_eq!(manager.list_versions("sum").unwrap(), (1..=6).collect::<Vec<_>>());
        assert_eq!(manager.get_version("sum", 3).unwrap().content, "v3");
    }

    #[test]
    fn test_duplicate_create_leaves_records_unchanged() {
        let (_dir, manager) = manager();
        manager.create("sum", "original").unwrap();

        let result = manager.create("sum", "replacement");
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));

        assert_eq!(manager.get("sum").unwrap().content, "original");
        assert_eq!(manager.get_version("sum", 1).unwrap().content, "original");
        assert_eq!(manager.list_versions("sum").unwrap(), vec![1]);
    }

    #[test]
    fn test_update_unknown_template() {
        let (_dir, manager) = manager();
        assert!(matches!(manager.update("nope", "x"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_everything() {
        let (_dir, manager) = manager();
        manager.create("sum", "a").unwrap();
        manager.update("sum", "b").unwrap();
        manager.update("sum", "c").unwrap();

        let report = manager.delete("sum").unwrap();
        assert_eq!(report.removed_count(), 4);
        assert!(!report.is_partial());

        assert!(matches!(manager.get("sum"), Err(StoreError::NotFound(_))));
        assert!(manager.list_versions("sum").unwrap().is_empty());
        assert!(matches!(manager.delete("sum"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_list_all_sorted_and_skips_malformed() {
        let (_dir, manager) = manager();
        manager.create("beta", "b").unwrap();
        manager.create("alpha", "a").unwrap();
        manager.update("beta", "b2").unwrap();
        fs::write(manager.storage().latest_path("broken"), "nope").unwrap();

        let summaries = manager.list_all().unwrap();
        assert_eq!(
            summaries,
            vec![
                TemplateSummary { name: "alpha".to_string(), version: 1 },
                TemplateSummary { name: "beta".to_string(), version: 2 },
            ]
        );
    }

    #[test]
    fn test_invalid_name_rejected() {
        let (_dir, manager) = manager();
        assert!(matches!(
            manager.create("../escape", "x"),
            Err(StoreError::InvalidName { .. })
        ));
        assert!(matches!(manager.create("", "x"), Err(StoreError::InvalidName { .. })));
    }

    #[test]
    fn test_pointer_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TemplateManager::new(FlakyStore::new(dir.path()));
        manager.create("sum", "v1").unwrap();

        manager.storage().fail_latest.set(true);
        let saved = manager.update("sum", "v2").unwrap();
        assert!(!saved.is_consistent());
        assert_eq!(saved.template.version, 2);

        // The pointer still says v1, but loading trusts the version records.
        assert_eq!(manager.storage().get_latest("sum").unwrap().version, 1);
        let latest = manager.get("sum").unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.content, "v2");

        // The next update builds on the real newest version.
        let saved = manager.update("sum", "v3").unwrap();
        assert_eq!(saved.template.version, 3);
    }

    #[test]
    fn test_create_with_failing_pointer_keeps_version_one() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TemplateManager::new(FlakyStore::new(dir.path()));
        manager.storage().fail_latest.set(true);

        let saved = manager.create("sum", "v1").unwrap();
        assert!(saved.pointer_error.is_some());
        assert!(manager.exists("sum"));
        assert!(matches!(manager.create("sum", "again"), Err(StoreError::AlreadyExists(_))));
        assert_eq!(
            manager.list_all().unwrap(),
            vec![TemplateSummary { name: "sum".to_string(), version: 1 }]
        );
    }

    #[test]
    fn test_partial_delete_is_reported_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TemplateManager::new(FlakyStore::new(dir.path()));
        manager.create("sum", "a").unwrap();
        manager.update("sum", "b").unwrap();
        manager.update("sum", "c").unwrap();
        manager.storage().stuck_version.set(Some(2));

        let report = manager.delete("sum").unwrap();
        assert!(report.is_partial());
        assert_eq!(report.removed_count(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, manager.storage().inner.version_path("sum", 2));

        // Nothing is rolled back; the surviving record is still loadable.
        assert_eq!(manager.list_versions("sum").unwrap(), vec![2]);
        assert_eq!(manager.get("sum").unwrap().content, "b");
    }

    #[test]
    fn test_update_at_max_version_fails() {
        let (_dir, manager) = manager();
        let mut last = Template::first("sum", "x");
        last.version = u32::MAX;
        manager.storage().put_version(&last).unwrap();
        manager.storage().put_latest(&last).unwrap();

        assert!(matches!(manager.update("sum", "y"), Err(StoreError::VersionOverflow(_))));
        assert_eq!(manager.list_versions("sum").unwrap(), vec![u32::MAX]);
    }

    #[test]
    fn test_reconcile_repairs_stale_pointer() {
        let (_dir, manager) = manager();
        manager.create("sum", "v1").unwrap();
        manager.update("sum", "v2").unwrap();

        // Simulate a crash between the version write and the pointer write.
        let v1 = manager.get_version("sum", 1).unwrap();
        manager.storage().put_latest(&v1).unwrap();

        assert_eq!(
            manager.reconcile("sum").unwrap(),
            Reconciliation::Repaired { from: Some(1), to: 2 }
        );
        assert_eq!(manager.storage().get_latest("sum").unwrap().version, 2);
        assert_eq!(
            manager.reconcile("sum").unwrap(),
            Reconciliation::Consistent { version: 2 }
        );
    }

    #[test]
    fn test_reconcile_missing_pointer() {
        let (_dir, manager) = manager();
        manager.create("sum", "v1").unwrap();
        fs::remove_file(manager.storage().latest_path("sum")).unwrap();

        assert_eq!(
            manager.reconcile("sum").unwrap(),
            Reconciliation::Repaired { from: None, to: 1 }
        );
        assert_eq!(manager.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_names_include_templates_without_pointer() {
        let (_dir, manager) = manager();
        manager.create("b", "x").unwrap();
        manager.update("b", "y").unwrap();
        manager.create("a", "x").unwrap();
        fs::remove_file(manager.storage().latest_path("a")).unwrap();

        assert_eq!(manager.names().unwrap(), vec!["a", "b"]);
        assert_eq!(
            manager.list_all().unwrap(),
            vec![
                TemplateSummary { name: "a".to_string(), version: 1 },
                TemplateSummary { name: "b".to_string(), version: 2 },
            ]
        );
    }

    #[test]
    fn test_list_all_uses_newest_version_record() {
        let (_dir, manager) = manager();
        manager.create("sum", "v1").unwrap();
        manager.update("sum", "v2").unwrap();
        let v1 = manager.get_version("sum", 1).unwrap();
        manager.storage().put_latest(&v1).unwrap();

        assert_eq!(
            manager.list_all().unwrap(),
            vec![TemplateSummary { name: "sum".to_string(), version: 2 }]
        );
        assert_eq!(manager.get("sum").unwrap().version, 2);
        // Listing leaves the pointer alone.
        let v1 = manager.get_version("sum", 1).unwrap();
        manager.storage().put_latest(&v1).unwrap();
        manager.list_all().unwrap();
        assert_eq!(manager.storage().get_latest("sum").unwrap().version, 1);
    }

    #[test]
    fn test_reconcile_unknown_template() {
        let (_dir, manager) = manager();
        assert!(matches!(manager.reconcile("nope"), Err(StoreError::NotFound(_))));
    }
}
