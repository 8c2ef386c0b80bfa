use crate::models::{NewUser, UserPreferences, UserRow};
use crate::{Database, OptionalExt, now};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, profile_photo_url, \
     preferred_species, preferred_size, temperament, activity_level, min_age, max_age, \
     is_admin, is_active, is_email_verified, email_verification_token, \
     email_verification_expires_at, email_verification_attempts, created_at";

impl Database {
    /// Insert a user. Returns false, writing nothing, when the email is taken.
    pub fn create_user(&self, user: &NewUser) -> Result<bool> {
        self.with_conn(|conn| {
            let p = &user.preferences;
            let n = conn.execute(
                "INSERT INTO users (id, email, first_name, last_name, password_hash, profile_photo_url,
                    preferred_species, preferred_size, temperament, activity_level, min_age, max_age,
                    is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(email) DO NOTHING",
                params![
                    user.id,
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.password_hash,
                    user.profile_photo_url,
                    p.preferred_species,
                    p.preferred_size,
                    p.temperament,
                    p.activity_level,
                    p.min_age,
                    p.max_age,
                    user.is_admin,
                    now(),
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                [email],
                |r| r.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn list_active_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY created_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![password_hash, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn update_preferences(&self, id: &str, prefs: &UserPreferences) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET preferred_species = ?1, preferred_size = ?2, temperament = ?3,
                    activity_level = ?4, min_age = ?5, max_age = ?6
                 WHERE id = ?7",
                params![
                    prefs.preferred_species,
                    prefs.preferred_size,
                    prefs.temperament,
                    prefs.activity_level,
                    prefs.min_age,
                    prefs.max_age,
                    id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    /// Soft delete. Returns false when no such user exists.
    pub fn deactivate_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE users SET is_active = 0 WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Store a fresh verification digest and reset the attempt counter.
    pub fn set_verification_code(&self, id: &str, digest: &str, expires_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET email_verification_token = ?1,
                    email_verification_expires_at = ?2,
                    email_verification_attempts = 0
                 WHERE id = ?3",
                params![digest, expires_at, id],
            )?;
            Ok(())
        })
    }

    pub fn record_failed_verification(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET email_verification_attempts = email_verification_attempts + 1
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn mark_email_verified(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET is_email_verified = 1,
                    email_verification_token = NULL,
                    email_verification_expires_at = NULL,
                    email_verification_attempts = 0
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password_hash: row.get(4)?,
        profile_photo_url: row.get(5)?,
        preferred_species: row.get(6)?,
        preferred_size: row.get(7)?,
        temperament: row.get(8)?,
        activity_level: row.get(9)?,
        min_age: row.get(10)?,
        max_age: row.get(11)?,
        is_admin: row.get(12)?,
        is_active: row.get(13)?,
        is_email_verified: row.get(14)?,
        email_verification_token: row.get(15)?,
        email_verification_expires_at: row.get(16)?,
        email_verification_attempts: row.get(17)?,
        created_at: row.get(18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};

    #[test]
    fn duplicate_email_is_rejected() {
        let db = db();
        user(&db, "alice");
        assert!(db.email_exists("alice@example.com").unwrap());

        let dup = NewUser {
            id: "other".into(),
            email: "alice@example.com".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            password_hash: "x".into(),
            profile_photo_url: None,
            preferences: UserPreferences::default(),
            is_admin: false,
        };
        assert!(!db.create_user(&dup).unwrap());
        assert!(db.get_user_by_id("other").unwrap().is_none());
    }

    #[test]
    fn deactivated_users_drop_out_of_listing() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");

        assert!(db.deactivate_user("bob").unwrap());
        assert!(!db.deactivate_user("nobody").unwrap());

        let active: Vec<_> = db.list_active_users().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(active, vec!["alice".to_string()]);
    }

    #[test]
    fn verification_lifecycle() {
        let db = db();
        user(&db, "alice");

        db.set_verification_code("alice", "digest", "2030-01-01T00:00:00.000Z").unwrap();
        db.record_failed_verification("alice").unwrap();
        db.record_failed_verification("alice").unwrap();
        let row = db.get_user_by_id("alice").unwrap().unwrap();
        assert_eq!(row.email_verification_attempts, 2);
        assert_eq!(row.email_verification_token.as_deref(), Some("digest"));

        db.mark_email_verified("alice").unwrap();
        let row = db.get_user_by_email("alice@example.com").unwrap().unwrap();
        assert!(row.is_email_verified);
        assert!(row.email_verification_token.is_none());
        assert_eq!(row.email_verification_attempts, 0);
    }
}
