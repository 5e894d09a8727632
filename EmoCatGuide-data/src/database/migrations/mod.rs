// Database migrations module
// Schema changes are additive and idempotent (CREATE ... IF NOT EXISTS)

mod sqlite;
pub use sqlite::run_migrations as run_sqlite_migrations;
