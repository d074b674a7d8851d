//! Resolving run/rollback requests into a plan for the external runner.

use std::fmt;
use std::path::PathBuf;

use stamp_core::error::{Result, StampError};

use super::record::MigrationRecord;
use super::registry::{Filter, MigrationRegistry};

/// Version the runner should migrate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Apply everything pending.
    Latest,
    /// Revert everything.
    Zero,
    /// Migrate up or down to this version.
    Version(String),
}

impl Target {
    /// Value handed to the runner; empty for [`Target::Latest`].
    pub fn as_arg(&self) -> &str {
        match self {
            Self::Latest => "",
            Self::Zero => "0",
            Self::Version(version) => version,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Zero => write!(f, "0"),
            Self::Version(version) => write!(f, "{}", version),
        }
    }
}

/// Everything the external runner needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub dir: PathBuf,
    pub target: Target,
    pub current: Option<i64>,
    pub allow_missing_files: bool,
    /// The migration the target was resolved from, if any.
    pub resolved: Option<MigrationRecord>,
}

impl MigrationRegistry {
    /// Plan a `run` to `target` (`None` = latest, `"0"` = all the way down).
    ///
    /// Any other target is a query that must match exactly one enabled migration.
    pub fn plan_run(
        &self,
        target: Option<&str>,
        current: Option<&str>,
        allow_missing_files: bool,
    ) -> Result<RunPlan> {
        let current = current
            .map(|value| {
                value.trim().parse::<i64>().map_err(|_| {
                    StampError::Validation(format!("Current version must be a number: {}", value))
                })
            })
            .transpose()?;

        let (target, resolved) = match target.map(str::trim) {
            None | Some("") => (Target::Latest, None),
            Some("0") => (Target::Zero, None),
            Some(query) => {
                let record = self.find_one(query, Filter::enabled_only())?.ok_or_else(|| {
                    StampError::NotFound(format!(
                        "Migration with this version not found: {}",
                        query
                    ))
                })?;
                (Target::Version(record.version().to_string()), Some(record))
            }
        };

        Ok(RunPlan {
            dir: self.dir().to_path_buf(),
            target,
            current,
            allow_missing_files,
            resolved,
        })
    }

    /// Plan a rollback of `step` migrations from the newest one.
    ///
    /// The sign of `step` is ignored. Only enabled migrations count, since the
    /// runner never sees disabled files.
    pub fn plan_rollback(&self, step: i64) -> Result<RunPlan> {
        let step = step.unsigned_abs();
        let mut all = self.find("*", Filter::enabled_only())?;

        let index = (all.len() as u64)
            .checked_sub(step + 1)
            .ok_or_else(|| {
                StampError::NotFound(format!(
                    "Cannot roll back {} step(s): only {} migration(s) exist",
                    step,
                    all.len()
                ))
            })?;
        let record = all.swap_remove(index as usize);

        Ok(RunPlan {
            dir: self.dir().to_path_buf(),
            target: Target::Version(record.version().to_string()),
            current: None,
            allow_missing_files: false,
            resolved: Some(record),
        })
    }
}
