use crate::models::{ChatMessageRow, ChatRow, NewChat};
use crate::{Database, OptionalExt, now};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use std::collections::HashMap;
use uuid::Uuid;

impl Database {
    /// Return the chat of `chat.kind` already linked to `chat.related_entity_id`
    /// (joining the creator to it), or create `chat`. The flag is true when a
    /// new chat was created.
    pub fn open_chat(&self, chat: &NewChat) -> Result<(ChatRow, bool)> {
        self.with_tx(|conn| {
            if let Some(entity) = chat.related_entity_id.as_deref() {
                if let Some(existing) = query_chat_for_entity(conn, &chat.kind, entity)? {
                    insert_member(conn, &existing.id, &chat.creator_id)?;
                    return Ok((existing, false));
                }
            }
            insert_chat(conn, chat)?;
            let created = query_chat(conn, &chat.id)?
                .ok_or_else(|| anyhow::anyhow!("chat {} vanished after insert", chat.id))?;
            Ok((created, true))
        })
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| query_chat(conn, id))
    }

    pub fn get_chat_members(&self, chat_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM chat_members WHERE chat_id = ?1 ORDER BY joined_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([chat_id], |r| r.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })
    }

    /// Every chat `user_id` belongs to, each with its member ids.
    pub fn list_chats_for_user(&self, user_id: &str) -> Result<Vec<(ChatRow, Vec<String>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.kind, c.related_entity_id, c.creator_id, c.created_at
                 FROM chats c
                 JOIN chat_members m ON m.chat_id = c.id
                 WHERE m.user_id = ?1
                 ORDER BY c.created_at DESC",
            )?;
            let chats = stmt
                .query_map([user_id], map_chat)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            // One query for all member lists instead of one per chat.
            let mut stmt = conn.prepare(
                "SELECT cm.chat_id, cm.user_id
                 FROM chat_members cm
                 JOIN chat_members me ON me.chat_id = cm.chat_id AND me.user_id = ?1
                 ORDER BY cm.joined_at ASC, cm.rowid ASC",
            )?;
            let mut members: HashMap<String, Vec<String>> = HashMap::new();
            let pairs = stmt.query_map([user_id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            for pair in pairs {
                let (chat_id, member) = pair?;
                members.entry(chat_id).or_default().push(member);
            }

            Ok(chats
                .into_iter()
                .map(|c| {
                    let m = members.remove(&c.id).unwrap_or_default();
                    (c, m)
                })
                .collect())
        })
    }

    pub fn is_chat_member(&self, chat_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM chat_members WHERE chat_id = ?1 AND user_id = ?2",
                params![chat_id, user_id],
                |r| r.get(0),
            )?;
            Ok(n > 0)
        })
    }

    /// Add a member. Returns false when they already belong to the chat.
    pub fn add_chat_member(&self, chat_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| insert_member(conn, chat_id, user_id))
    }

    pub fn insert_chat_message(
        &self,
        id: &str,
        chat_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<ChatMessageRow> {
        let created_at = now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, chat_id, sender_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, chat_id, sender_id, content, created_at],
            )?;
            Ok(())
        })?;
        Ok(ChatMessageRow {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            created_at,
        })
    }

    /// The oldest `limit` messages of a chat, oldest first.
    pub fn list_chat_messages(&self, chat_id: &str, limit: u32) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, sender_id, content, created_at
                 FROM chat_messages
                 WHERE chat_id = ?1
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![chat_id, limit], |row| {
                    Ok(ChatMessageRow {
                        id: row.get(0)?,
                        chat_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Insert the chat and its creator as first member.
pub(crate) fn insert_chat(conn: &Connection, chat: &NewChat) -> Result<()> {
    conn.execute(
        "INSERT INTO chats (id, kind, related_entity_id, creator_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![chat.id, chat.kind, chat.related_entity_id, chat.creator_id, now()],
    )?;
    insert_member(conn, &chat.id, &chat.creator_id)?;
    Ok(())
}

pub(crate) fn insert_member(conn: &Connection, chat_id: &str, user_id: &str) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO chat_members (id, chat_id, user_id, joined_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![Uuid::new_v4().to_string(), chat_id, user_id, now()],
    )?;
    Ok(n > 0)
}

fn query_chat(conn: &Connection, id: &str) -> Result<Option<ChatRow>> {
    conn.query_row(
        "SELECT id, kind, related_entity_id, creator_id, created_at FROM chats WHERE id = ?1",
        [id],
        map_chat,
    )
    .optional()
}

fn query_chat_for_entity(conn: &Connection, kind: &str, entity: &str) -> Result<Option<ChatRow>> {
    conn.query_row(
        "SELECT id, kind, related_entity_id, creator_id, created_at FROM chats
         WHERE kind = ?1 AND related_entity_id = ?2
         ORDER BY created_at ASC LIMIT 1",
        params![kind, entity],
        map_chat,
    )
    .optional()
}

fn map_chat(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        related_entity_id: row.get(2)?,
        creator_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};

    fn new_chat(id: &str, creator: &str, entity: Option<&str>) -> NewChat {
        NewChat {
            id: id.into(),
            kind: "rescue".into(),
            related_entity_id: entity.map(String::from),
            creator_id: creator.into(),
        }
    }

    #[test]
    fn open_chat_reuses_the_entity_chat() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");

        let (first, created) = db.open_chat(&new_chat("c1", "alice", Some("r1"))).unwrap();
        assert!(created);
        let (second, created) = db.open_chat(&new_chat("c2", "bob", Some("r1"))).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(db.get_chat_members("c1").unwrap(), vec!["alice", "bob"]);
        assert!(db.get_chat("c2").unwrap().is_none());
    }

    #[test]
    fn membership_is_unique() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");
        db.open_chat(&new_chat("c1", "alice", None)).unwrap();

        assert!(!db.add_chat_member("c1", "alice").unwrap());
        assert!(db.add_chat_member("c1", "bob").unwrap());
        assert!(db.is_chat_member("c1", "bob").unwrap());

        let listed = db.list_chats_for_user("bob").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].1, vec!["alice", "bob"]);
    }

    #[test]
    fn messages_come_back_oldest_first_and_limited() {
        let db = db();
        user(&db, "alice");
        db.open_chat(&new_chat("c1", "alice", None)).unwrap();
        for i in 0..5 {
            db.insert_chat_message(&format!("m{i}"), "c1", "alice", &format!("hello {i}"))
                .unwrap();
        }

        let msgs = db.list_chat_messages("c1", 3).unwrap();
        let ids: Vec<_> = msgs.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }
}
