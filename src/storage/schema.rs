//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the classfeed database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS scrape_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_name TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    classes_found INTEGER NOT NULL DEFAULT 0,
    classes_uploaded INTEGER NOT NULL DEFAULT 0,
    error_text TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_provider ON scrape_runs(provider_name);

-- Scraped class rows, one per accepted candidate
CREATE TABLE IF NOT EXISTS classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scrape_run_id INTEGER NOT NULL REFERENCES scrape_runs(id),
    provider_record_id TEXT NOT NULL,
    provider_name TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    start_time TEXT NOT NULL,
    location_name TEXT NOT NULL,
    location_address TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    trainer TEXT NOT NULL,
    intensity INTEGER NOT NULL,
    price REAL NOT NULL,
    booking_url TEXT NOT NULL,
    capacity INTEGER NOT NULL,
    tags TEXT NOT NULL,
    enrichment TEXT,
    uploaded INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_classes_identity ON classes(provider_record_id, start_time);
CREATE INDEX IF NOT EXISTS idx_classes_uploaded ON classes(uploaded);
CREATE INDEX IF NOT EXISTS idx_classes_run ON classes(scrape_run_id);

-- Running per-provider aggregates
CREATE TABLE IF NOT EXISTS provider_stats (
    name TEXT PRIMARY KEY,
    enabled INTEGER NOT NULL DEFAULT 1,
    last_scrape_time TEXT,
    total_runs INTEGER NOT NULL DEFAULT 0,
    successful_runs INTEGER NOT NULL DEFAULT 0,
    total_classes_found INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
