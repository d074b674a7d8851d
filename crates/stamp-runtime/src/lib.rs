//! Timestamped migration file registry.
//!
//! [`MigrationRegistry`] owns one directory of `<version>_<name>.rb[.bak]`
//! files and exposes create/find/rename/reconcile operations over it.
//! Running the migrations is delegated to an external [`MigrationRunner`].

pub mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::{
    AppliedMigrations, CommandRunner, DumpHook, Filter, MigrationRecord, MigrationRegistry,
    MigrationRunner, PgAppliedMigrations, Reconciliation, RunPlan, StaticApplied, Target,
};
