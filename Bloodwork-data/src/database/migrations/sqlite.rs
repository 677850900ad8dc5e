use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_measurement_definitions_table(conn)?;
    create_test_events_table(conn)?;
    create_measurements_table(conn)?;
    create_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the catalog of measurement definitions
fn create_measurement_definitions_table(conn: &Connection) -> Result<(), String> {
    info!("Creating measurement_definitions table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS measurement_definitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name_de TEXT NOT NULL,
            name_en TEXT NOT NULL,
            description_de TEXT NOT NULL DEFAULT '',
            description_en TEXT NOT NULL DEFAULT '',
            unit TEXT NOT NULL,
            category TEXT NOT NULL,
            min_male REAL,
            max_male REAL,
            min_female REAL,
            max_female REAL,
            min_normal REAL,
            max_normal REAL,
            critical_low REAL,
            critical_high REAL,
            high_meaning_de TEXT,
            high_meaning_en TEXT,
            low_meaning_de TEXT,
            low_meaning_en TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the test events table
fn create_test_events_table(conn: &Connection) -> Result<(), String> {
    info!("Creating test_events table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS test_events (
            id TEXT PRIMARY KEY,
            test_date TEXT NOT NULL,
            lab_name TEXT,
            doctor_name TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the measurements table; rows go away with their test event
fn create_measurements_table(conn: &Connection) -> Result<(), String> {
    info!("Creating measurements table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS measurements (
            id TEXT PRIMARY KEY,
            test_id TEXT NOT NULL REFERENCES test_events (id) ON DELETE CASCADE,
            definition_id INTEGER NOT NULL REFERENCES measurement_definitions (id),
            value REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'NORMAL',
            notes TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

fn create_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating indexes");

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_test_events_test_date
            ON test_events (test_date DESC);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_measurements_test_definition
            ON measurements (test_id, definition_id);
        CREATE INDEX IF NOT EXISTS idx_measurements_definition
            ON measurements (definition_id);
        CREATE INDEX IF NOT EXISTS idx_measurement_definitions_category
            ON measurement_definitions (category, sort_order);",
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
