//! Directory-backed registry of migration files.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use stamp_core::error::{Result, StampError};
use tracing::{debug, info};

use super::record::{MigrationRecord, VERSION_FORMAT};
use super::template::migration_content;

/// Source of the current time used for version stamps.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Which enabled-states a query admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    /// Keep migrations without the disabling suffix.
    pub enabled: bool,
    /// Keep migrations with the disabling suffix.
    pub disabled: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled: true,
        }
    }
}

impl Filter {
    pub fn enabled_only() -> Self {
        Self {
            enabled: true,
            disabled: false,
        }
    }

    pub fn disabled_only() -> Self {
        Self {
            enabled: false,
            disabled: true,
        }
    }

    fn admits(&self, record: &MigrationRecord) -> bool {
        if record.disabled() {
            self.disabled
        } else {
            self.enabled
        }
    }
}

/// Registry of the migration files in one directory.
///
/// Nothing is cached: every call lists the directory again.
#[derive(Clone)]
pub struct MigrationRegistry {
    dir: PathBuf,
    clock: Clock,
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl MigrationRegistry {
    /// Create a registry over `dir` using the local wall clock.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the clock used for new version stamps.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The migration directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `record` lives (or would live) in this directory.
    pub fn path_for(&self, record: &MigrationRecord) -> PathBuf {
        self.dir.join(record.encode())
    }

    fn new_version(&self) -> String {
        (self.clock)().format(VERSION_FORMAT).to_string()
    }

    /// Create a new migration file stamped with the current minute.
    pub fn create(&self, name: &str, content: Option<&str>) -> Result<MigrationRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StampError::Validation(
                "You must specify a migration name".into(),
            ));
        }
        if name.contains(['.', '/', '\\']) {
            return Err(StampError::Validation(format!(
                "Migration name must not contain '.', '/' or '\\': {}",
                name
            )));
        }

        let mut record = MigrationRecord::new(self.new_version(), name, false);
        let path = self.path_for(&record);

        fs::create_dir_all(&self.dir)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StampError::Conflict(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(migration_content(content).as_bytes())?;

        info!("Created migration {}", path.display());
        record.set_path(path);
        Ok(record)
    }

    /// All migrations whose filename matches `query`, oldest first.
    ///
    /// The query is a substring; `*` matches any run of characters, so `"*"`
    /// matches everything. Entries that are not migration files are skipped.
    pub fn find(&self, query: &str, filter: Filter) -> Result<Vec<MigrationRecord>> {
        if !self.dir.is_dir() {
            debug!("Migrations directory does not exist: {:?}", self.dir);
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();

            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non UTF-8 entry {:?}", path);
                continue;
            };
            if !matches_query(&file_name, query) || !path.is_file() {
                continue;
            }

            match MigrationRecord::from_path(&path) {
                Ok(record) => entries.push((file_name, record)),
                Err(e) => debug!("Skipping {}: {}", file_name, e),
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let mut records: Vec<MigrationRecord> = entries
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| filter.admits(record))
            .collect();
        records.sort_by(MigrationRecord::cmp_version);

        debug!("Query {:?} matched {} migration(s)", query, records.len());
        Ok(records)
    }

    /// The single migration matching `query`.
    ///
    /// Returns `Ok(None)` when nothing matches and
    /// [`StampError::AmbiguousQuery`] when more than one file does.
    pub fn find_one(&self, query: &str, filter: Filter) -> Result<Option<MigrationRecord>> {
        let mut matches = self.find(query, filter)?;
        if matches.len() > 1 {
            return Err(StampError::AmbiguousQuery {
                query: query.to_string(),
                matches: matches.iter().map(MigrationRecord::basename).collect(),
            });
        }
        Ok(matches.pop())
    }

    /// Every migration, enabled and disabled, oldest first.
    pub fn list(&self) -> Result<Vec<MigrationRecord>> {
        self.find("*", Filter::default())
    }

    /// Give the matching migration a fresh version stamp.
    pub fn reversion(&self, query: &str) -> Result<MigrationRecord> {
        let mut record = self.resolve(query)?;
        let version = self.new_version();
        self.rename(&mut record, Some(version), None)?;
        Ok(record)
    }

    /// Append the disabling suffix to the matching migration.
    pub fn disable(&self, query: &str) -> Result<MigrationRecord> {
        let mut record = self.resolve(query)?;
        if record.disabled() {
            return Err(StampError::AlreadyDisabled(record.basename()));
        }
        self.rename(&mut record, None, Some(true))?;
        Ok(record)
    }

    /// Remove the disabling suffix from the matching migration.
    pub fn enable(&self, query: &str) -> Result<MigrationRecord> {
        let mut record = self.resolve(query)?;
        if !record.disabled() {
            return Err(StampError::NotDisabled(record.basename()));
        }
        self.rename(&mut record, None, Some(false))?;
        Ok(record)
    }

    fn resolve(&self, query: &str) -> Result<MigrationRecord> {
        if query.trim().is_empty() {
            return Err(StampError::Validation(
                "You must specify a migration name or version".into(),
            ));
        }
        self.find_one(query, Filter::default())?
            .ok_or_else(|| StampError::NotFound(format!("No migration matches '{}'", query)))
    }

    /// Apply a version/disabled change, renaming the backing file if any.
    ///
    /// `record` is only updated once the rename succeeded.
    fn rename(
        &self,
        record: &mut MigrationRecord,
        version: Option<String>,
        disabled: Option<bool>,
    ) -> Result<()> {
        let mut updated = record.clone();
        if let Some(version) = version {
            updated.set_version(version);
        }
        if let Some(disabled) = disabled {
            updated.set_disabled(disabled);
        }

        if let Some(from) = record.path() {
            let to = self.path_for(&updated);
            if from != to {
                if to.exists() {
                    return Err(StampError::Conflict(to.display().to_string()));
                }
                fs::rename(from, &to)?;
                info!("Renamed migration {} to {}", from.display(), to.display());
            }
            updated.set_path(to);
        }

        *record = updated;
        Ok(())
    }
}

/// Substring match where `*` stands for any run of characters.
fn matches_query(file_name: &str, query: &str) -> bool {
    let mut rest = file_name;
    for part in query.split('*').filter(|p| !p.is_empty()) {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn registry(dir: &TempDir) -> MigrationRegistry {
        MigrationRegistry::new(dir.path()).with_clock(|| at(2024, 3, 4, 5, 6))
    }

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), "Sequel.migration do\nend\n").unwrap();
    }

    fn basenames(records: &[MigrationRecord]) -> Vec<String> {
        records.iter().map(MigrationRecord::basename).collect()
    }

    #[test]
    fn test_matches_query() {
        assert!(matches_query("202401010000_a.rb", "*"));
        assert!(matches_query("202401010000_a.rb", ""));
        assert!(matches_query("202401010000_users.rb", "users"));
        assert!(matches_query("202401010000_users.rb", "2024*users"));
        assert!(!matches_query("202401010000_users.rb", "users*2024"));
        assert!(!matches_query("202401010000_users.rb", "posts"));
    }

    #[test]
    fn test_create_with_default_content() {
        let dir = TempDir::new().unwrap();
        let record = registry(&dir).create("Add Users Table", None).unwrap();

        assert_eq!(record.version(), "202403040506");
        assert_eq!(record.name(), "add_users_table");
        assert!(!record.disabled());

        let path = dir.path().join("202403040506_add_users_table.rb");
        assert_eq!(record.path(), Some(path.as_path()));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "# frozen_string_literal: true\n\nSequel.migration do\n\tchange do\n\tend\nend\n"
        );
    }

    #[test]
    fn test_create_makes_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("db").join("migrations");
        let registry = MigrationRegistry::new(&nested).with_clock(|| at(2024, 1, 1, 0, 0));

        let record = registry.create("init", Some("up do\nend")).unwrap();
        assert_eq!(record.path(), Some(nested.join("202401010000_init.rb").as_path()));
        assert!(fs::read_to_string(nested.join("202401010000_init.rb"))
            .unwrap()
            .contains("\tup do\n\tend\n"));
    }

    #[test]
    fn test_create_requires_name() {
        let dir = TempDir::new().unwrap();
        let err = registry(&dir).create("   ", None).unwrap_err();
        assert!(matches!(err, StampError::Validation(_)));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_create_rejects_codec_breaking_names() {
        let dir = TempDir::new().unwrap();
        for name in ["add.users", "../escape", "a\\b"] {
            let err = registry(&dir).create(name, None).unwrap_err();
            assert!(matches!(err, StampError::Validation(_)), "{}", name);
        }
    }

    #[test]
    fn test_create_same_minute_conflicts() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry.create("init", Some("first")).unwrap();

        let err = registry.create("Init", Some("second")).unwrap_err();
        assert!(matches!(err, StampError::Conflict(_)));
        assert!(fs::read_to_string(dir.path().join("202403040506_init.rb"))
            .unwrap()
            .contains("\tfirst\n"));
    }

    #[test]
    fn test_find_all_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202402020000_b.rb.bak");
        touch(&dir, "202401010000_a.rb");
        let registry = registry(&dir);

        let all = registry.find("*", Filter::default()).unwrap();
        assert_eq!(basenames(&all), vec!["202401010000_a.rb", "202402020000_b.rb.bak"]);

        let enabled = registry.find("*", Filter::enabled_only()).unwrap();
        assert_eq!(basenames(&enabled), vec!["202401010000_a.rb"]);

        let disabled = registry.find("*", Filter::disabled_only()).unwrap();
        assert_eq!(basenames(&disabled), vec!["202402020000_b.rb.bak"]);

        let none = registry
            .find(
                "*",
                Filter {
                    enabled: false,
                    disabled: false,
                },
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_sorts_by_version_not_name() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202403030000_a.rb");
        touch(&dir, "202401010000_z.rb");
        touch(&dir, "202402020000_m.rb");

        let all = registry(&dir).list().unwrap();
        let versions: Vec<&str> = all.iter().map(MigrationRecord::version).collect();
        assert_eq!(versions, vec!["202401010000", "202402020000", "202403030000"]);
    }

    #[test]
    fn test_find_skips_directories_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_a.rb");
        touch(&dir, ".gitkeep");
        touch(&dir, "notes.txt");
        fs::create_dir(dir.path().join("202402020000_dir.rb")).unwrap();

        let all = registry(&dir).list().unwrap();
        assert_eq!(basenames(&all), vec!["202401010000_a.rb"]);
    }

    #[test]
    fn test_find_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = MigrationRegistry::new(dir.path().join("missing"));
        assert!(registry.list().unwrap().is_empty());
        assert!(registry.find_one("a", Filter::default()).unwrap().is_none());
    }

    #[test]
    fn test_find_one() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_create_users.rb");
        touch(&dir, "202402020000_create_posts.rb");
        let registry = registry(&dir);

        let one = registry.find_one("users", Filter::default()).unwrap().unwrap();
        assert_eq!(one.basename(), "202401010000_create_users.rb");

        let by_version = registry.find_one("20240202", Filter::default()).unwrap().unwrap();
        assert_eq!(by_version.name(), "create_posts");

        assert!(registry.find_one("comments", Filter::default()).unwrap().is_none());

        let err = registry.find_one("create", Filter::default()).unwrap_err();
        match err {
            StampError::AmbiguousQuery { query, matches } => {
                assert_eq!(query, "create");
                assert_eq!(matches.len(), 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_colliding_versions() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_init.rb");
        touch(&dir, "202401010000_init.rb.bak");
        let registry = registry(&dir);

        let err = registry.find_one("init", Filter::default()).unwrap_err();
        assert!(matches!(err, StampError::AmbiguousQuery { .. }));

        let enabled = registry.find_one("init", Filter::enabled_only()).unwrap().unwrap();
        assert_eq!(enabled.basename(), "202401010000_init.rb");
    }

    #[test]
    fn test_disable_then_enable_round_trip() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_add_users.rb");
        let registry = registry(&dir);

        let disabled = registry.disable("add_users").unwrap();
        assert!(disabled.disabled());
        assert_eq!(disabled.basename(), "202401010000_add_users.rb.bak");
        assert!(dir.path().join("202401010000_add_users.rb.bak").is_file());
        assert!(!dir.path().join("202401010000_add_users.rb").exists());

        let enabled = registry.enable("add_users").unwrap();
        assert!(!enabled.disabled());
        assert_eq!(enabled.basename(), "202401010000_add_users.rb");
        assert_eq!(enabled.version(), "202401010000");
        assert!(dir.path().join("202401010000_add_users.rb").is_file());
        assert!(!dir.path().join("202401010000_add_users.rb.bak").exists());
    }

    #[test]
    fn test_disable_twice_fails() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_a.rb");
        let registry = registry(&dir);

        registry.disable("a.rb").unwrap();
        let err = registry.disable("a.rb").unwrap_err();
        assert!(matches!(err, StampError::AlreadyDisabled(_)));
        assert!(dir.path().join("202401010000_a.rb.bak").is_file());
    }

    #[test]
    fn test_enable_enabled_fails() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_a.rb");

        let err = registry(&dir).enable("a").unwrap_err();
        assert!(matches!(err, StampError::NotDisabled(_)));
        assert!(dir.path().join("202401010000_a.rb").is_file());
    }

    #[test]
    fn test_mutations_require_a_match() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_a.rb");
        let registry = registry(&dir);

        assert!(matches!(registry.disable("nope"), Err(StampError::NotFound(_))));
        assert!(matches!(registry.enable("nope"), Err(StampError::NotFound(_))));
        assert!(matches!(registry.reversion("nope"), Err(StampError::NotFound(_))));
        assert!(matches!(registry.reversion(""), Err(StampError::Validation(_))));
    }

    #[test]
    fn test_reversion_keeps_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("202401010000_add_users.rb.bak"), "body").unwrap();

        let record = registry(&dir).reversion("add_users").unwrap();
        assert_eq!(record.version(), "202403040506");
        assert!(record.disabled());
        assert_eq!(record.basename(), "202403040506_add_users.rb.bak");

        let moved = dir.path().join("202403040506_add_users.rb.bak");
        assert_eq!(fs::read_to_string(moved).unwrap(), "body");
        assert!(!dir.path().join("202401010000_add_users.rb.bak").exists());
    }

    #[test]
    fn test_reversion_to_same_stamp_is_noop() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202403040506_a.rb");

        let record = registry(&dir).reversion("a").unwrap();
        assert_eq!(record.basename(), "202403040506_a.rb");
        assert!(dir.path().join("202403040506_a.rb").is_file());
    }

    #[test]
    fn test_rename_onto_existing_file_conflicts() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_init.rb");
        touch(&dir, "202401010000_init.rb.bak");
        let registry = registry(&dir);

        let err = registry.disable("init.rb").unwrap_err();
        assert!(matches!(err, StampError::AmbiguousQuery { .. }));

        let mut record = registry.find_one("init", Filter::enabled_only()).unwrap().unwrap();
        let err = registry.rename(&mut record, None, Some(true)).unwrap_err();
        assert!(matches!(err, StampError::Conflict(_)));
        assert!(!record.disabled());
        assert!(dir.path().join("202401010000_init.rb").is_file());
    }

    #[test]
    fn test_rename_of_vanished_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "202401010000_a.rb");
        let registry = registry(&dir);

        let mut record = registry.find_one("a", Filter::default()).unwrap().unwrap();
        fs::remove_file(dir.path().join("202401010000_a.rb")).unwrap();

        let err = registry.rename(&mut record, None, Some(true)).unwrap_err();
        assert!(matches!(err, StampError::Io(_)));
        assert!(!record.disabled());
    }

    #[test]
    fn test_rename_without_file_only_updates_record() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let mut record = MigrationRecord::new("202401010000", "ghost", false);

        registry
            .rename(&mut record, Some("202405050505".into()), Some(true))
            .unwrap();
        assert_eq!(record.encode(), "202405050505_ghost.rb.bak");
        assert!(record.path().is_none());
    }
}
