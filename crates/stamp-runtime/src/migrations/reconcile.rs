use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use stamp_core::error::Result;

use super::record::MigrationRecord;
use super::registry::{Filter, MigrationRegistry};

/// Drift between the runner's applied list and the enabled files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Applied according to the runner, but missing or disabled on disk.
    pub only_applied: Vec<MigrationRecord>,
    /// Enabled on disk, but not applied yet.
    pub only_existing: Vec<MigrationRecord>,
}

impl Reconciliation {
    /// No drift in either direction.
    pub fn is_clean(&self) -> bool {
        self.only_applied.is_empty() && self.only_existing.is_empty()
    }
}

impl MigrationRegistry {
    /// Compare applied filenames reported by the runner with the enabled files.
    ///
    /// Read-only. Both sides of the result are ordered by version.
    pub fn reconcile<S: AsRef<str>>(&self, applied_filenames: &[S]) -> Result<Reconciliation> {
        let applied = applied_filenames
            .iter()
            .map(|filename| {
                let filename = filename.as_ref();
                let basename = Path::new(filename)
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or(filename)
                    .to_string();
                MigrationRecord::decode(filename).map(|record| (basename, record))
            })
            .collect::<Result<Vec<_>>>()?;

        let existing = self.find("*", Filter::enabled_only())?;

        let existing_names: HashSet<String> =
            existing.iter().map(MigrationRecord::basename).collect();
        let applied_names: HashSet<&str> = applied.iter().map(|(name, _)| name.as_str()).collect();

        let mut only_applied: Vec<MigrationRecord> = applied
            .iter()
            .filter(|(name, _)| !existing_names.contains(name))
            .map(|(_, record)| record.clone())
            .collect();
        only_applied.sort_by(MigrationRecord::cmp_version);

        let only_existing = existing
            .into_iter()
            .filter(|record| !applied_names.contains(record.basename().as_str()))
            .collect();

        Ok(Reconciliation {
            only_applied,
            only_existing,
        })
    }
}
