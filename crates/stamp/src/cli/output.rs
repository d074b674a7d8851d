use console::style;
use std::path::Path;

use stamp_runtime::MigrationRecord;

/// Print one listing line: `[version] datetime title`.
pub fn print_record(record: &MigrationRecord) {
    let version = style(format!("[{}]", record.version())).white();
    if record.disabled() {
        println!(
            "{} {} {}",
            version,
            style(record.display_datetime()).white(),
            style(record.display_title()).white()
        );
    } else {
        println!(
            "{} {} {}",
            version,
            style(record.display_datetime()).cyan(),
            record.display_title()
        );
    }
}

/// The record's file relative to the working directory when possible.
pub fn display_path(record: &MigrationRecord) -> String {
    let Some(path) = record.path() else {
        return record.basename();
    };
    relative_to_cwd(path)
}

fn relative_to_cwd(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(|p| p.display().to_string()))
        .unwrap_or_else(|| path.display().to_string())
}
