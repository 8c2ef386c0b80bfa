use crate::models::{NewStrayMapEntry, StrayMapRow};
use crate::{Database, OptionalExt, now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

const STRAY_COLUMNS: &str = "id, user_id, name, description, contact_info, latitude, longitude, \
     location_type, created_at, updated_at";

impl Database {
    pub fn create_stray_map_entry(&self, entry: &NewStrayMapEntry) -> Result<StrayMapRow> {
        self.with_conn(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO stray_map_entries (id, user_id, name, description, contact_info,
                    latitude, longitude, location_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.name,
                    entry.description,
                    entry.contact_info,
                    entry.latitude,
                    entry.longitude,
                    entry.location_type,
                    ts,
                ],
            )?;
            query_entry(conn, &entry.id)?
                .ok_or_else(|| anyhow!("stray map entry {} vanished after insert", entry.id))
        })
    }

    /// All entries, or only those of one `location_type`.
    pub fn list_stray_map_entries(&self, location_type: Option<&str>) -> Result<Vec<StrayMapRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {STRAY_COLUMNS} FROM stray_map_entries
                 WHERE ?1 IS NULL OR location_type = ?1
                 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([location_type], map_entry)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_stray_map_entry(&self, id: &str) -> Result<Option<StrayMapRow>> {
        self.with_conn(|conn| query_entry(conn, id))
    }

    pub fn delete_stray_map_entry(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM stray_map_entries WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_entry(conn: &Connection, id: &str) -> Result<Option<StrayMapRow>> {
    let sql = format!("SELECT {STRAY_COLUMNS} FROM stray_map_entries WHERE id = ?1");
    conn.query_row(&sql, [id], map_entry).optional()
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<StrayMapRow> {
    Ok(StrayMapRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        contact_info: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        location_type: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
