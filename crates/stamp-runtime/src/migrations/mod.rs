mod applied;
mod plan;
mod reconcile;
mod record;
mod registry;
mod runner;
mod template;

pub use applied::{AppliedMigrations, PgAppliedMigrations, StaticApplied};
pub use plan::{RunPlan, Target};
pub use reconcile::Reconciliation;
pub use record::{
    is_disabling_marker, normalize_name, MigrationRecord, DISABLING_SUFFIX, SCRIPT_EXTENSION,
    VERSION_FORMAT,
};
pub use registry::{Clock, Filter, MigrationRegistry};
pub use runner::{CommandRunner, DumpHook, MigrationRunner};
pub use template::{migration_content, DEFAULT_BODY};
