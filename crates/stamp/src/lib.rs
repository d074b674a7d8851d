//! stamp - timestamped migration files
//!
//! Creates, renames, queries and reconciles a directory of
//! `<version>_<name>.rb` migrations. Running them is left to an external
//! migration runner.

pub use stamp_core::{Result, StampConfig, StampError};
pub use stamp_runtime::migrations;
pub use stamp_runtime::{
    AppliedMigrations, CommandRunner, DumpHook, Filter, MigrationRecord, MigrationRegistry,
    MigrationRunner, Reconciliation, RunPlan, StaticApplied, Target,
};
