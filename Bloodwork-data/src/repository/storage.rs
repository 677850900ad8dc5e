use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::DatabasePool;
use crate::models::{
    HistoryPointRecord, MeasurementDefinitionRecord, MeasurementRecord, MeasurementWithDefinitionRecord,
    NewMeasurementRecord, NewTestEventRecord, StatusCountRecord, TestEventRecord,
};
use super::errors::RepositoryError;

const DEFINITION_COLUMNS: &str = "d.id, d.code, d.name_de, d.name_en, d.description_de, d.description_en, \
    d.unit, d.category, d.min_male, d.max_male, d.min_female, d.max_female, d.min_normal, d.max_normal, \
    d.critical_low, d.critical_high, d.high_meaning_de, d.high_meaning_en, d.low_meaning_de, d.low_meaning_en, \
    d.sort_order";

const MEASUREMENT_COLUMNS: &str = "m.id, m.test_id, m.definition_id, m.value, m.status, m.notes";

const TEST_COLUMNS: &str = "id, test_date, lab_name, doctor_name, notes, created_at";

const CATALOG_ORDER: &str = "ORDER BY d.category, d.sort_order, d.name_de";

fn map_definition(row: &Row, offset: usize) -> rusqlite::Result<MeasurementDefinitionRecord> {
    Ok(MeasurementDefinitionRecord {
        id: row.get(offset)?,
        code: row.get(offset + 1)?,
        name_de: row.get(offset + 2)?,
        name_en: row.get(offset + 3)?,
        description_de: row.get(offset + 4)?,
        description_en: row.get(offset + 5)?,
        unit: row.get(offset + 6)?,
        category: row.get(offset + 7)?,
        min_male: row.get(offset + 8)?,
        max_male: row.get(offset + 9)?,
        min_female: row.get(offset + 10)?,
        max_female: row.get(offset + 11)?,
        min_normal: row.get(offset + 12)?,
        max_normal: row.get(offset + 13)?,
        critical_low: row.get(offset + 14)?,
        critical_high: row.get(offset + 15)?,
        high_meaning_de: row.get(offset + 16)?,
        high_meaning_en: row.get(offset + 17)?,
        low_meaning_de: row.get(offset + 18)?,
        low_meaning_en: row.get(offset + 19)?,
        sort_order: row.get(offset + 20)?,
    })
}

fn map_measurement(row: &Row) -> rusqlite::Result<MeasurementRecord> {
    Ok(MeasurementRecord {
        id: row.get(0)?,
        test_id: row.get(1)?,
        definition_id: row.get(2)?,
        value: row.get(3)?,
        status: row.get(4)?,
        notes: row.get(5)?,
    })
}

fn map_test(row: &Row) -> rusqlite::Result<TestEventRecord> {
    Ok(TestEventRecord {
        id: row.get(0)?,
        test_date: row.get(1)?,
        lab_name: row.get(2)?,
        doctor_name: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn select_measurement(
    conn: &rusqlite::Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Option<MeasurementRecord>, RepositoryError> {
    let sql = format!("SELECT {} FROM measurements m WHERE {}", MEASUREMENT_COLUMNS, clause);
    Ok(conn.query_row(&sql, params, map_measurement).optional()?)
}

/// SQLite storage operations for the catalog, test events and measurements
pub struct DatabaseStorage;

impl DatabaseStorage {
    pub async fn list_definitions(pool: &DatabasePool) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
        debug!("Listing measurement definitions from database");
        let conn = pool.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM measurement_definitions d {}",
            DEFINITION_COLUMNS, CATALOG_ORDER
        ))?;
        let definitions = stmt
            .query_map([], |row| map_definition(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(definitions)
    }

    pub async fn search_definitions(
        pool: &DatabasePool,
        query: &str,
    ) -> Result<Vec<MeasurementDefinitionRecord>, RepositoryError> {
        debug!("Searching measurement definitions for '{}'", query);
        let conn = pool.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM measurement_definitions d
             WHERE d.name_de LIKE '%' || ?1 || '%'
                OR d.name_en LIKE '%' || ?1 || '%'
                OR d.code LIKE '%' || ?1 || '%'
                OR d.category LIKE '%' || ?1 || '%'
             {}",
            DEFINITION_COLUMNS, CATALOG_ORDER
        ))?;
        let definitions = stmt
            .query_map([query], |row| map_definition(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(definitions)
    }

    pub async fn get_definition(
        pool: &DatabasePool,
        id: i64,
    ) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
        let conn = pool.connection()?;
        let definition = conn
            .query_row(
                &format!("SELECT {} FROM measurement_definitions d WHERE d.id = ?1", DEFINITION_COLUMNS),
                [id],
                |row| map_definition(row, 0),
            )
            .optional()?;
        Ok(definition)
    }

    pub async fn get_definition_by_code(
        pool: &DatabasePool,
        code: &str,
    ) -> Result<Option<MeasurementDefinitionRecord>, RepositoryError> {
        let conn = pool.connection()?;
        let definition = conn
            .query_row(
                &format!("SELECT {} FROM measurement_definitions d WHERE d.code = ?1", DEFINITION_COLUMNS),
                [code],
                |row| map_definition(row, 0),
            )
            .optional()?;
        Ok(definition)
    }

    /// Insert a test event and all of its measurements in one transaction
    pub async fn create_test(
        pool: &DatabasePool,
        test: TestEventRecord,
        measurements: Vec<NewMeasurementRecord>,
    ) -> Result<(TestEventRecord, Vec<MeasurementRecord>), RepositoryError> {
        debug!("Storing test event in database: id={}", test.id);
        let mut conn = pool.connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO test_events (id, test_date, lab_name, doctor_name, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![test.id, test.test_date, test.lab_name, test.doctor_name, test.notes, test.created_at],
        )?;

        let mut stored = Vec::with_capacity(measurements.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO measurements (id, test_id, definition_id, value, status, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for input in measurements {
                let record = MeasurementRecord {
                    id: Uuid::new_v4().to_string(),
                    test_id: test.id.clone(),
                    definition_id: input.definition_id,
                    value: input.value,
                    status: input.status,
                    notes: input.notes,
                };
                stmt.execute(params![
                    record.id,
                    record.test_id,
                    record.definition_id,
                    record.value,
                    record.status,
                    record.notes
                ])?;
                stored.push(record);
            }
        }

        tx.commit()?;
        Ok((test, stored))
    }

    pub async fn get_test(pool: &DatabasePool, id: &Uuid) -> Result<Option<TestEventRecord>, RepositoryError> {
        let conn = pool.connection()?;
        let test = conn
            .query_row(
                &format!("SELECT {} FROM test_events WHERE id = ?1", TEST_COLUMNS),
                [id.to_string()],
                map_test,
            )
            .optional()?;
        Ok(test)
    }

    /// List test events, newest first, optionally bounded by test date (inclusive)
    pub async fn list_tests(
        pool: &DatabasePool,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<TestEventRecord>, RepositoryError> {
        debug!("Listing test events from database");
        let conn = pool.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM test_events
             WHERE (?1 IS NULL OR test_date >= ?1)
               AND (?2 IS NULL OR test_date <= ?2)
             ORDER BY test_date DESC, created_at DESC",
            TEST_COLUMNS
        ))?;
        let tests = stmt
            .query_map(params![start_date, end_date], map_test)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tests)
    }

    /// Count measurements per test event and status in one grouped query
    pub async fn status_counts(
        pool: &DatabasePool,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<StatusCountRecord>, RepositoryError> {
        let conn = pool.connection()?;

        let mut stmt = conn.prepare(
            "SELECT m.test_id, m.status, COUNT(*) FROM measurements m
             JOIN test_events t ON m.test_id = t.id
             WHERE (?1 IS NULL OR t.test_date >= ?1)
               AND (?2 IS NULL OR t.test_date <= ?2)
             GROUP BY m.test_id, m.status",
        )?;
        let counts = stmt
            .query_map(params![start_date, end_date], |row| {
                Ok(StatusCountRecord {
                    test_id: row.get(0)?,
                    status: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    pub async fn update_test(
        pool: &DatabasePool,
        id: &Uuid,
        update: NewTestEventRecord,
    ) -> Result<Option<TestEventRecord>, RepositoryError> {
        let conn = pool.connection()?;
        let changed = conn.execute(
            "UPDATE test_events SET test_date = ?2, lab_name = ?3, doctor_name = ?4, notes = ?5 WHERE id = ?1",
            params![id.to_string(), update.test_date, update.lab_name, update.doctor_name, update.notes],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        drop(conn);
        Self::get_test(pool, id).await
    }

    pub async fn delete_test(pool: &DatabasePool, id: &Uuid) -> Result<bool, RepositoryError> {
        debug!("Deleting test event from database: id={}", id);
        let conn = pool.connection()?;
        let deleted = conn.execute("DELETE FROM test_events WHERE id = ?1", [id.to_string()])?;
        Ok(deleted > 0)
    }

    /// Insert a measurement or replace the value already stored for the same definition
    pub async fn upsert_measurement(
        pool: &DatabasePool,
        test_id: &Uuid,
        input: NewMeasurementRecord,
    ) -> Result<MeasurementRecord, RepositoryError> {
        let conn = pool.connection()?;
        let test_id = test_id.to_string();

        let test_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM test_events WHERE id = ?1)",
            [&test_id],
            |row| row.get(0),
        )?;
        if !test_exists {
            return Err(RepositoryError::NotFound(format!("Test event {} not found", test_id)));
        }

        let definition_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM measurement_definitions WHERE id = ?1)",
            [input.definition_id],
            |row| row.get(0),
        )?;
        if !definition_exists {
            return Err(RepositoryError::NotFound(format!(
                "Measurement definition {} not found",
                input.definition_id
            )));
        }

        conn.execute(
            "INSERT INTO measurements (id, test_id, definition_id, value, status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (test_id, definition_id)
             DO UPDATE SET value = excluded.value, status = excluded.status, notes = excluded.notes",
            params![
                Uuid::new_v4().to_string(),
                test_id,
                input.definition_id,
                input.value,
                input.status,
                input.notes
            ],
        )?;

        select_measurement(
            &conn,
            "m.test_id = ?1 AND m.definition_id = ?2",
            params![test_id, input.definition_id],
        )?
        .ok_or_else(|| RepositoryError::NotFound(format!("Measurement for test {} vanished after upsert", test_id)))
    }

    pub async fn get_measurement(pool: &DatabasePool, id: &Uuid) -> Result<Option<MeasurementRecord>, RepositoryError> {
        let conn = pool.connection()?;
        select_measurement(&conn, "m.id = ?1", [id.to_string()])
    }

    pub async fn update_measurement(
        pool: &DatabasePool,
        id: &Uuid,
        value: f64,
        status: &str,
        notes: Option<String>,
    ) -> Result<Option<MeasurementRecord>, RepositoryError> {
        let conn = pool.connection()?;
        let changed = conn.execute(
            "UPDATE measurements SET value = ?2, status = ?3, notes = ?4 WHERE id = ?1",
            params![id.to_string(), value, status, notes],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        select_measurement(&conn, "m.id = ?1", [id.to_string()])
    }

    pub async fn delete_measurement(pool: &DatabasePool, id: &Uuid) -> Result<bool, RepositoryError> {
        let conn = pool.connection()?;
        let deleted = conn.execute("DELETE FROM measurements WHERE id = ?1", [id.to_string()])?;
        Ok(deleted > 0)
    }

    /// All measurements of a test joined with their definitions, read in a single query
    pub async fn measurements_for_test(
        pool: &DatabasePool,
        test_id: &Uuid,
    ) -> Result<Vec<MeasurementWithDefinitionRecord>, RepositoryError> {
        debug!("Loading measurements for test event: id={}", test_id);
        let conn = pool.connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {} FROM measurements m
             JOIN measurement_definitions d ON m.definition_id = d.id
             WHERE m.test_id = ?1
             {}",
            MEASUREMENT_COLUMNS, DEFINITION_COLUMNS, CATALOG_ORDER
        ))?;
        let joined = stmt
            .query_map([test_id.to_string()], |row| {
                Ok(MeasurementWithDefinitionRecord {
                    measurement: map_measurement(row)?,
                    definition: map_definition(row, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(joined)
    }

    /// Stored values of one definition across all tests, oldest test first
    pub async fn history_for_definition(
        pool: &DatabasePool,
        definition_id: i64,
    ) -> Result<Vec<HistoryPointRecord>, RepositoryError> {
        let conn = pool.connection()?;

        let mut stmt = conn.prepare(
            "SELECT m.id, m.test_id, t.test_date, m.value, m.status
             FROM measurements m
             JOIN test_events t ON m.test_id = t.id
             WHERE m.definition_id = ?1
             ORDER BY t.test_date ASC, t.created_at ASC",
        )?;
        let points = stmt
            .query_map([definition_id], |row| {
                Ok(HistoryPointRecord {
                    measurement_id: row.get(0)?,
                    test_id: row.get(1)?,
                    test_date: row.get(2)?,
                    value: row.get(3)?,
                    status: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(points)
    }
}
