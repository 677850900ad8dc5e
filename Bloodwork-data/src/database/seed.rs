//! Bundled reference catalog
//!
//! The catalog ships as JSON inside the binary and is written to the
//! `measurement_definitions` table the first time an empty database is opened.

use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::DatabaseError;
use crate::models::MeasurementDefinitionRecord;

const CATALOG_SEED: &str = include_str!("../../resources/catalog_seed.json");

/// Parse the bundled catalog
pub fn load_catalog_seed() -> Result<Vec<MeasurementDefinitionRecord>, DatabaseError> {
    let definitions: Vec<MeasurementDefinitionRecord> = serde_json::from_str(CATALOG_SEED)?;
    debug!("Loaded {} catalog definitions from bundled seed", definitions.len());
    Ok(definitions)
}

/// Insert the bundled catalog if the table is empty
///
/// Returns the number of definitions written.
pub fn seed_catalog(conn: &Connection) -> Result<usize, DatabaseError> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM measurement_definitions", [], |row| row.get(0))?;
    if existing > 0 {
        debug!("Catalog already holds {} definitions, skipping seed", existing);
        return Ok(0);
    }

    let definitions = load_catalog_seed()?;
    info!("Seeding {} catalog definitions", definitions.len());

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO measurement_definitions
             (code, name_de, name_en, description_de, description_en, unit, category,
              min_male, max_male, min_female, max_female, min_normal, max_normal,
              critical_low, critical_high,
              high_meaning_de, high_meaning_en, low_meaning_de, low_meaning_en, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
        )?;

        for definition in &definitions {
            stmt.execute(params![
                definition.code,
                definition.name_de,
                definition.name_en,
                definition.description_de,
                definition.description_en,
                definition.unit,
                definition.category,
                definition.min_male,
                definition.max_male,
                definition.min_female,
                definition.max_female,
                definition.min_normal,
                definition.max_normal,
                definition.critical_low,
                definition.critical_high,
                definition.high_meaning_de,
                definition.high_meaning_en,
                definition.low_meaning_de,
                definition.low_meaning_en,
                definition.sort_order,
            ])?;
        }
    }
    tx.commit()?;

    Ok(definitions.len())
}
