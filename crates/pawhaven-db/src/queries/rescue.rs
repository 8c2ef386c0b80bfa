use crate::models::{NewChat, NewRescueReport, RescueReportRow};
use crate::queries::chats::insert_chat;
use crate::{Database, OptionalExt, now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

const RESOLVED: &str = "Resolved";

const RESCUE_SELECT: &str = "SELECT r.id, r.user_id, r.description, r.location, r.latitude, \
     r.longitude, r.photo, r.status, r.alert_type, r.chat_id, r.created_at, r.updated_at, \
     u.first_name, u.last_name \
     FROM rescue_reports r LEFT JOIN users u ON u.id = r.user_id";

impl Database {
    /// Insert the report and its rescue chat together.
    pub fn create_rescue_report(
        &self,
        report: &NewRescueReport,
        chat: &NewChat,
    ) -> Result<RescueReportRow> {
        self.with_tx(|conn| {
            insert_chat(conn, chat)?;
            let ts = now();
            conn.execute(
                "INSERT INTO rescue_reports (id, user_id, description, location, latitude,
                    longitude, photo, status, alert_type, chat_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    report.id,
                    report.user_id,
                    report.description,
                    report.location,
                    report.latitude,
                    report.longitude,
                    report.photo,
                    report.status,
                    report.alert_type,
                    chat.id,
                    ts,
                ],
            )?;
            query_report(conn, "r.id", &report.id)?
                .ok_or_else(|| anyhow!("rescue report {} vanished after insert", report.id))
        })
    }

    pub fn list_rescue_reports(&self) -> Result<Vec<RescueReportRow>> {
        self.with_conn(|conn| {
            let sql = format!("{RESCUE_SELECT} ORDER BY r.created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_report)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Reports carrying both coordinates, optionally skipping one user's own.
    pub fn list_located_rescue_reports(
        &self,
        exclude_user: Option<&str>,
    ) -> Result<Vec<RescueReportRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{RESCUE_SELECT}
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

    pub fn get_rescue_report(&self, id: &str) -> Result<Option<RescueReportRow>> {
        self.with_conn(|conn| query_report(conn, "r.id", id))
    }

    pub fn get_rescue_report_by_chat(&self, chat_id: &str) -> Result<Option<RescueReportRow>> {
        self.with_conn(|conn| query_report(conn, "r.chat_id", chat_id))
    }

    /// Write every editable column. Returns true only when this call moved
    /// the report into Resolved; the status read and the write share one
    /// transaction, so concurrent resolves report the transition once.
    pub fn update_rescue_report(&self, report: &RescueReportRow) -> Result<bool> {
        self.with_tx(|conn| {
            let previous: Option<String> = conn
                .query_row(
                    "SELECT status FROM rescue_reports WHERE id = ?1",
                    [&report.id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(previous) = previous else {
                return Ok(false);
            };
            conn.execute(
                "UPDATE rescue_reports SET description = ?1, location = ?2, latitude = ?3,
                    longitude = ?4, photo = ?5, status = ?6, alert_type = ?7, chat_id = ?8,
                    updated_at = ?9
                 WHERE id = ?10",
                params![
                    report.description,
                    report.location,
                    report.latitude,
                    report.longitude,
                    report.photo,
                    report.status,
                    report.alert_type,
                    report.chat_id,
                    now(),
                    report.id,
                ],
            )?;
            Ok(previous != RESOLVED && report.status == RESOLVED)
        })
    }

    pub fn delete_rescue_report(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM rescue_reports WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_report(conn: &Connection, column: &str, value: &str) -> Result<Option<RescueReportRow>> {
    let sql = format!("{RESCUE_SELECT} WHERE {column} = ?1 LIMIT 1");
    conn.query_row(&sql, [value], map_report).optional()
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<RescueReportRow> {
    Ok(RescueReportRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        photo: row.get(6)?,
        status: row.get(7)?,
        alert_type: row.get(8)?,
        chat_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        reporter_first_name: row.get(12)?,
        reporter_last_name: row.get(13)?,
    })
}

#[cfg(test)]
pub(crate) fn sample_rescue(id: &str, user_id: &str, coords: Option<(f64, f64)>) -> NewRescueReport {
    NewRescueReport {
        id: id.into(),
        user_id: user_id.into(),
        description: Some("injured cat".into()),
        location: "Main st".into(),
        latitude: coords.map(|c| c.0),
        longitude: coords.map(|c| c.1),
        photo: None,
        status: "Pending".into(),
        alert_type: "High".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};

    fn chat_for(id: &str, creator: &str) -> NewChat {
        NewChat {
            id: format!("chat-{id}"),
            kind: "rescue".into(),
            related_entity_id: Some(id.into()),
            creator_id: creator.into(),
        }
    }

    #[test]
    fn report_carries_reporter_names_and_chat() {
        let db = db();
        user(&db, "alice");
        let report = db
            .create_rescue_report(&sample_rescue("r1", "alice", None), &chat_for("r1", "alice"))
            .unwrap();

        assert_eq!(report.reporter_first_name.as_deref(), Some("alice-first"));
        assert_eq!(report.chat_id.as_deref(), Some("chat-r1"));
        assert!(db.is_chat_member("chat-r1", "alice").unwrap());
        assert_eq!(db.get_rescue_report_by_chat("chat-r1").unwrap().unwrap().id, "r1");
    }

    #[test]
    fn failed_report_insert_rolls_back_the_chat() {
        let db = db();
        user(&db, "alice");
        db.create_rescue_report(&sample_rescue("r1", "alice", None), &chat_for("r1", "alice"))
            .unwrap();

        // Same report id again, fresh chat id: the report insert fails.
        let mut chat = chat_for("r1", "alice");
        chat.id = "chat-other".into();
        assert!(db.create_rescue_report(&sample_rescue("r1", "alice", None), &chat).is_err());
        assert!(db.get_chat("chat-other").unwrap().is_none());
    }

    #[test]
    fn located_reports_skip_missing_coordinates_and_excluded_user() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");
        db.create_rescue_report(
            &sample_rescue("a1", "alice", Some((1.0, 2.0))),
            &chat_for("a1", "alice"),
        )
        .unwrap();
        db.create_rescue_report(&sample_rescue("b1", "bob", None), &chat_for("b1", "bob"))
            .unwrap();
        db.create_rescue_report(
            &sample_rescue("b2", "bob", Some((1.0, 2.0))),
            &chat_for("b2", "bob"),
        )
        .unwrap();

        assert_eq!(db.list_located_rescue_reports(None).unwrap().len(), 2);
        let others: Vec<_> = db
            .list_located_rescue_reports(Some("alice"))
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(others, vec!["b2".to_string()]);
    }

    #[test]
    fn only_the_first_resolve_reports_a_transition() {
        let db = db();
        user(&db, "alice");
        db.create_rescue_report(&sample_rescue("r1", "alice", None), &chat_for("r1", "alice"))
            .unwrap();

        let mut report = db.get_rescue_report("r1").unwrap().unwrap();
        report.description = Some("still waiting".into());
        assert!(!db.update_rescue_report(&report).unwrap());

        // Two updates built from the same stale Pending read.
        report.status = "Resolved".into();
        assert!(db.update_rescue_report(&report).unwrap());
        assert!(!db.update_rescue_report(&report).unwrap());

        let stored = db.get_rescue_report("r1").unwrap().unwrap();
        assert_eq!(stored.status, "Resolved");
        assert_eq!(stored.description.as_deref(), Some("still waiting"));

        report.id = "missing".into();
        assert!(!db.update_rescue_report(&report).unwrap());
    }
}
