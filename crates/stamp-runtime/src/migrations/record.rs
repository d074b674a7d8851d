//! Migration records and the filename codec.
//!
//! A migration file carries its whole state in its name:
//! `<version>_<name>.rb[.bak]`. [`MigrationRecord::decode`] and
//! [`MigrationRecord::encode`] are exact inverses for normalized records.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use stamp_core::error::{Result, StampError};

/// Extension of migration scripts.
pub const SCRIPT_EXTENSION: &str = "rb";

/// Suffix that keeps a migration on disk but hidden from the runner.
pub const DISABLING_SUFFIX: &str = ".bak";

/// `chrono` format of a version stamp (minute resolution).
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M";

/// One migration file, on disk or reconstructed from a stored filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    version: String,
    name: String,
    disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

impl MigrationRecord {
    /// Create a record that is not backed by a file.
    pub fn new(version: impl Into<String>, name: &str, disabled: bool) -> Self {
        Self {
            version: version.into(),
            name: normalize_name(name),
            disabled,
            path: None,
        }
    }

    /// Parse a filename. Only the last path component is looked at.
    pub fn decode(filename: &str) -> Result<Self> {
        let basename = Path::new(filename)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        let invalid = || StampError::InvalidFilename(filename.to_string());

        let (version, remainder) = basename.split_once('_').ok_or_else(invalid)?;
        if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut parts = remainder.split('.');
        let name = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if parts.next() != Some(SCRIPT_EXTENSION) {
            return Err(invalid());
        }

        let disabled = match parts.next() {
            None => false,
            Some(marker) if is_disabling_marker(marker) => true,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            version: version.to_string(),
            name: normalize_name(name),
            disabled,
            path: None,
        })
    }

    /// Parse the filename of an existing file and remember its path.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StampError::InvalidFilename(path.display().to_string()))?;

        let mut record = Self::decode(filename)?;
        record.path = Some(path);
        Ok(record)
    }

    /// The filename this record encodes to.
    pub fn encode(&self) -> String {
        format!(
            "{}_{}.{}{}",
            self.version,
            self.name,
            SCRIPT_EXTENSION,
            if self.disabled { DISABLING_SUFFIX } else { "" }
        )
    }

    /// File name of the backing file, or the encoded name when there is none.
    pub fn basename(&self) -> String {
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.encode())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Chronological ordering. Names are not compared.
    pub fn cmp_version(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }

    /// The version as a timestamp, if it is a well-formed stamp.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.version, VERSION_FORMAT).ok()
    }

    /// Human readable name, e.g. `add_users_table` becomes `Add users table`.
    pub fn title(&self) -> String {
        let spaced = self.name.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }

    /// Title as shown in listings, marking disabled migrations.
    pub fn display_title(&self) -> String {
        if self.disabled {
            format!("- {} (disabled)", self.title())
        } else {
            self.title()
        }
    }

    /// Listing timestamp (`YYYY-MM-DD HH:MM`), falling back to the raw version.
    pub fn display_datetime(&self) -> String {
        self.created_at()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| self.version.clone())
    }

    pub(crate) fn set_version(&mut self, version: String) {
        self.version = version;
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }
}

impl fmt::Display for MigrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.version,
            self.display_datetime(),
            self.display_title()
        )
    }
}

/// Spaces become underscores, everything lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Whether `value` is the disabling suffix, with or without its leading dot.
pub fn is_disabling_marker(value: &str) -> bool {
    value == DISABLING_SUFFIX || Some(value) == DISABLING_SUFFIX.strip_prefix('.')
}
