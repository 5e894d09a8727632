use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_health_reports_table(conn)?;
    create_psychology_tests_table(conn)?;
    create_cat_cards_table(conn)?;
    create_user_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the users table
fn create_users_table(conn: &Connection) -> Result<(), String> {
    info!("Creating users table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            gender TEXT,
            created_at TEXT NOT NULL,
            last_login TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the health reports table
fn create_health_reports_table(conn: &Connection) -> Result<(), String> {
    info!("Creating health_reports table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_reports (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            filename TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            file_type TEXT NOT NULL,
            upload_time TEXT NOT NULL,
            analysis_status TEXT NOT NULL,
            report_date TEXT,
            vital_stats TEXT,
            health_score INTEGER,
            warnings TEXT NOT NULL DEFAULT '[]'
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the psychology tests table
fn create_psychology_tests_table(conn: &Connection) -> Result<(), String> {
    info!("Creating psychology_tests table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS psychology_tests (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            question1 TEXT NOT NULL,
            question2 TEXT NOT NULL,
            submit_time TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the cat cards table
fn create_cat_cards_table(conn: &Connection) -> Result<(), String> {
    info!("Creating cat_cards table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cat_cards (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            cat TEXT NOT NULL,
            title TEXT NOT NULL,
            image_url TEXT NOT NULL,
            feedback TEXT NOT NULL,
            mood TEXT NOT NULL,
            health_score INTEGER,
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Per-user lookup indexes, newest first. A user holds at most one report.
fn create_user_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating per-user indexes");

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_health_reports_user
            ON health_reports (user_id, upload_time DESC);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_health_reports_one_per_user
            ON health_reports (user_id);
        CREATE INDEX IF NOT EXISTS idx_psychology_tests_user
            ON psychology_tests (user_id, submit_time DESC);
        CREATE INDEX IF NOT EXISTS idx_cat_cards_user
            ON cat_cards (user_id, created_at DESC);",
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
