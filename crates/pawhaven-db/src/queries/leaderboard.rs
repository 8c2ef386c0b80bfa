use crate::models::{LeaderboardRow, NewLeaderboardEntry};
use crate::{Database, OptionalExt, now};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

/// Which leaderboard counter an award bumps alongside the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    Rescue,
    Adoption,
    LostPet,
    MapContribution,
    None,
}

impl Contribution {
    fn column(self) -> Option<&'static str> {
        match self {
            Contribution::Rescue => Some("rescues"),
            Contribution::Adoption => Some("adoptions"),
            Contribution::LostPet => Some("lost_pets"),
            Contribution::MapContribution => Some("map_contributions"),
            Contribution::None => None,
        }
    }
}

const LEADERBOARD_SELECT: &str = "SELECT l.id, l.user_id, l.score, l.last_active, l.rescues, \
     l.adoptions, l.lost_pets, l.map_contributions, l.created_at, \
     u.first_name, u.last_name, u.profile_photo_url \
     FROM leaderboard_users l JOIN users u ON u.id = l.user_id";

impl Database {
    /// Add `points` to the user's score, bump the contribution counter by one
    /// and stamp `last_active`, creating the row on first award.
    pub fn award(&self, user_id: &str, points: i64, contribution: Contribution) -> Result<()> {
        self.with_tx(|conn| award_points(conn, user_id, points, contribution))
    }

    /// Award every sender in a chat `points_per_message` for each message they
    /// sent, plus one bump of `contribution`. Runs in its own transaction and
    /// returns how many users were awarded.
    pub fn award_chat_participants(
        &self,
        chat_id: &str,
        points_per_message: i64,
        contribution: Contribution,
    ) -> Result<usize> {
        self.with_tx(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sender_id, COUNT(*) FROM chat_messages
                 WHERE chat_id = ?1
                 GROUP BY sender_id
                 ORDER BY sender_id",
            )?;
            let counts = stmt
                .query_map([chat_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for (sender, messages) in &counts {
                award_points(conn, sender, messages * points_per_message, contribution)?;
            }
            Ok(counts.len())
        })
    }

    /// All entries, highest score first.
    pub fn list_leaderboard(&self) -> Result<Vec<LeaderboardRow>> {
        self.with_conn(|conn| {
            let sql = format!("{LEADERBOARD_SELECT} ORDER BY l.score DESC, l.created_at ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_entry)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The user's entry and its rank: one plus the number of strictly higher
    /// scores.
    pub fn get_leaderboard_entry(&self, user_id: &str) -> Result<Option<(LeaderboardRow, usize)>> {
        self.with_conn(|conn| {
            let sql = format!("{LEADERBOARD_SELECT} WHERE l.user_id = ?1");
            let Some(entry) = conn.query_row(&sql, [user_id], map_entry).optional()? else {
                return Ok(None);
            };
            let higher: i64 = conn.query_row(
                "SELECT COUNT(*) FROM leaderboard_users WHERE score > ?1",
                [entry.score],
                |r| r.get(0),
            )?;
            Ok(Some((entry, higher as usize + 1)))
        })
    }

    pub fn create_leaderboard_entry(&self, entry: &NewLeaderboardEntry) -> Result<()> {
        self.with_conn(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO leaderboard_users (id, user_id, score, last_active, rescues, adoptions,
                    lost_pets, map_contributions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?4)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.score,
                    ts,
                    entry.rescues,
                    entry.adoptions,
                    entry.lost_pets,
                    entry.map_contributions,
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_leaderboard_entry(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM leaderboard_users WHERE user_id = ?1", [user_id])?;
            Ok(n > 0)
        })
    }
}

pub(crate) fn award_points(
    conn: &Connection,
    user_id: &str,
    points: i64,
    contribution: Contribution,
) -> Result<()> {
    let ts = now();
    conn.execute(
        "INSERT INTO leaderboard_users (id, user_id, last_active, created_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(user_id) DO NOTHING",
        params![Uuid::new_v4().to_string(), user_id, ts],
    )?;

    let bump = match contribution.column() {
        Some(col) => format!(", {col} = {col} + 1"),
        None => String::new(),
    };
    conn.execute(
        &format!(
            "UPDATE leaderboard_users SET score = score + ?1, last_active = ?2{bump}
             WHERE user_id = ?3"
        ),
        params![points, ts, user_id],
    )?;
    Ok(())
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<LeaderboardRow> {
    Ok(LeaderboardRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        score: row.get(2)?,
        last_active: row.get(3)?,
        rescues: row.get(4)?,
        adoptions: row.get(5)?,
        lost_pets: row.get(6)?,
        map_contributions: row.get(7)?,
        created_at: row.get(8)?,
        first_name: row.get(9)?,
        last_name: row.get(10)?,
        avatar: row.get(11)?,
    })
}
