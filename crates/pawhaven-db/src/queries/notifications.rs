use crate::models::{NewNotification, NotificationRow};
use crate::{Database, OptionalExt, now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, message, kind, chat_id, report_id, viewed, created_at";

impl Database {
    pub fn create_notification(&self, notification: &NewNotification) -> Result<NotificationRow> {
        self.with_conn(|conn| {
            insert_notification(conn, notification)?;
            query_notification(conn, &notification.id)?
                .ok_or_else(|| anyhow!("notification {} vanished after insert", notification.id))
        })
    }

    /// Insert unless the user already holds a notification for the same
    /// (chat, report, kind). NULLs compare equal here. Returns whether a row
    /// was written.
    pub fn create_notification_if_absent(&self, notification: &NewNotification) -> Result<bool> {
        self.with_tx(|conn| {
            let existing: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications
                 WHERE user_id = ?1 AND chat_id IS ?2 AND report_id IS ?3 AND kind IS ?4",
                params![
                    notification.user_id,
                    notification.chat_id,
                    notification.report_id,
                    notification.kind,
                ],
                |r| r.get(0),
            )?;
            if existing > 0 {
                return Ok(false);
            }
            insert_notification(conn, notification)?;
            Ok(true)
        })
    }

    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_notification(&self, id: &str) -> Result<Option<NotificationRow>> {
        self.with_conn(|conn| query_notification(conn, id))
    }

    pub fn mark_notification_viewed(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE notifications SET viewed = 1 WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn insert_notification(conn: &Connection, n: &NewNotification) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, message, kind, chat_id, report_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![n.id, n.user_id, n.message, n.kind, n.chat_id, n.report_id, now()],
    )?;
    Ok(())
}

fn query_notification(conn: &Connection, id: &str) -> Result<Option<NotificationRow>> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1");
    conn.query_row(&sql, [id], map_notification).optional()
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        kind: row.get(3)?,
        chat_id: row.get(4)?,
        report_id: row.get(5)?,
        viewed: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewChat;
    use crate::queries::lost_found::sample_lost;
    use crate::queries::test_support::{db, user};

    fn nearby(id: &str, user_id: &str, chat: Option<&str>, report: Option<&str>) -> NewNotification {
        NewNotification {
            id: id.into(),
            user_id: user_id.into(),
            message: "Nearby lost pet: Milo at Park".into(),
            kind: Some("lostpet".into()),
            chat_id: chat.map(String::from),
            report_id: report.map(String::from),
        }
    }

    #[test]
    fn duplicates_are_skipped_per_user() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");
        db.create_lost_found_report(
            &sample_lost("l1", "alice", Some((0.0, 0.0))),
            &NewChat {
                id: "c1".into(),
                kind: "lostpet".into(),
                related_entity_id: Some("l1".into()),
                creator_id: "alice".into(),
            },
        )
        .unwrap();

        assert!(db.create_notification_if_absent(&nearby("n1", "bob", Some("c1"), Some("l1"))).unwrap());
        assert!(!db.create_notification_if_absent(&nearby("n2", "bob", Some("c1"), Some("l1"))).unwrap());
        assert!(db.create_notification_if_absent(&nearby("n3", "alice", Some("c1"), Some("l1"))).unwrap());

        // A NULL chat still deduplicates against another NULL chat.
        assert!(db.create_notification_if_absent(&nearby("n4", "bob", None, Some("l1"))).unwrap());
        assert!(!db.create_notification_if_absent(&nearby("n5", "bob", None, Some("l1"))).unwrap());

        assert_eq!(db.list_notifications("bob").unwrap().len(), 2);
    }

    #[test]
    fn viewed_flag_is_persisted() {
        let db = db();
        user(&db, "alice");
        let created = db
            .create_notification(&NewNotification {
                id: "n1".into(),
                user_id: "alice".into(),
                message: "hello".into(),
                kind: None,
                chat_id: None,
                report_id: None,
            })
            .unwrap();
        assert!(!created.viewed);

        assert!(db.mark_notification_viewed("n1").unwrap());
        assert!(db.get_notification("n1").unwrap().unwrap().viewed);
        assert!(!db.mark_notification_viewed("missing").unwrap());
    }
}
