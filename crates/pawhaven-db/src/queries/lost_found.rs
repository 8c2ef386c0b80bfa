use crate::models::{LostFoundRow, NewChat, NewLostFoundReport};
use crate::queries::chats::insert_chat;
use crate::{Database, OptionalExt, now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

const LOST_FOUND_SELECT: &str = "SELECT r.id, r.user_id, r.pet_name, r.pet_type, r.gender, \
     r.description, r.location, r.latitude, r.longitude, r.photo, r.status, r.chat_id, \
     r.created_at, r.updated_at, u.first_name, u.last_name \
     FROM lost_found_reports r LEFT JOIN users u ON u.id = r.user_id";

impl Database {
    pub fn create_lost_found_report(
        &self,
        report: &NewLostFoundReport,
        chat: &NewChat,
    ) -> Result<LostFoundRow> {
        self.with_tx(|conn| {
            insert_chat(conn, chat)?;
            let ts = now();
            conn.execute(
                "INSERT INTO lost_found_reports (id, user_id, pet_name, pet_type, gender,
                    description, location, latitude, longitude, photo, status, chat_id,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                params![
                    report.id,
                    report.user_id,
                    report.pet_name,
                    report.pet_type,
                    report.gender,
                    report.description,
                    report.location,
                    report.latitude,
                    report.longitude,
                    report.photo,
                    report.status,
                    chat.id,
                    ts,
                ],
            )?;
            query_report(conn, "r.id", &report.id)?
                .ok_or_else(|| anyhow!("lost-found report {} vanished after insert", report.id))
        })
    }

    pub fn list_lost_found_reports(&self) -> Result<Vec<LostFoundRow>> {
        self.with_conn(|conn| {
            let sql = format!("{LOST_FOUND_SELECT} ORDER BY r.created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_report)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_located_lost_found_reports(
        &self,
        exclude_user: Option<&str>,
    ) -> Result<Vec<LostFoundRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{LOST_FOUND_SELECT}
                 WHERE r.latitude IS NOT NULL AND r.longitude IS NOT NULL
                   AND (?1 IS NULL OR r.user_id != ?1)
                 ORDER BY r.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([exclude_user], map_report)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_lost_found_report(&self, id: &str) -> Result<Option<LostFoundRow>> {
        self.with_conn(|conn| query_report(conn, "r.id", id))
    }

    pub fn get_lost_found_report_by_chat(&self, chat_id: &str) -> Result<Option<LostFoundRow>> {
        self.with_conn(|conn| query_report(conn, "r.chat_id", chat_id))
    }

    pub fn update_lost_found_report(&self, report: &LostFoundRow) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE lost_found_reports SET pet_name = ?1, pet_type = ?2, gender = ?3,
                    description = ?4, location = ?5, latitude = ?6, longitude = ?7, photo = ?8,
                    status = ?9, chat_id = ?10, updated_at = ?11
                 WHERE id = ?12",
                params![
                    report.pet_name,
                    report.pet_type,
                    report.gender,
                    report.description,
                    report.location,
                    report.latitude,
                    report.longitude,
                    report.photo,
                    report.status,
                    report.chat_id,
                    now(),
                    report.id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_lost_found_report(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM lost_found_reports WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_report(conn: &Connection, column: &str, value: &str) -> Result<Option<LostFoundRow>> {
    let sql = format!("{LOST_FOUND_SELECT} WHERE {column} = ?1 LIMIT 1");
    conn.query_row(&sql, [value], map_report).optional()
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<LostFoundRow> {
    Ok(LostFoundRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        pet_name: row.get(2)?,
        pet_type: row.get(3)?,
        gender: row.get(4)?,
        description: row.get(5)?,
        location: row.get(6)?,
        latitude: row.get(7)?,
        longitude: row.get(8)?,
        photo: row.get(9)?,
        status: row.get(10)?,
        chat_id: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        reporter_first_name: row.get(14)?,
        reporter_last_name: row.get(15)?,
    })
}

#[cfg(test)]
pub(crate) fn sample_lost(id: &str, user_id: &str, coords: Option<(f64, f64)>) -> NewLostFoundReport {
    NewLostFoundReport {
        id: id.into(),
        user_id: user_id.into(),
        pet_name: Some("Milo".into()),
        pet_type: Some("cat".into()),
        gender: "Unknown".into(),
        description: None,
        location: "Park".into(),
        latitude: coords.map(|c| c.0),
        longitude: coords.map(|c| c.1),
        photo: None,
        status: "Lost".into(),
    }
}
