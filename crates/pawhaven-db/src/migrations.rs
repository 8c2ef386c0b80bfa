use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                              TEXT PRIMARY KEY,
                email                           TEXT NOT NULL UNIQUE,
                first_name                      TEXT NOT NULL,
                last_name                       TEXT NOT NULL,
                password_hash                   TEXT NOT NULL,
                profile_photo_url               TEXT,
                preferred_species               TEXT,
                preferred_size                  TEXT,
                temperament                     TEXT,
                activity_level                  TEXT,
                min_age                         INTEGER,
                max_age                         INTEGER,
                is_admin                        INTEGER NOT NULL DEFAULT 0,
                is_active                       INTEGER NOT NULL DEFAULT 1,
                is_email_verified               INTEGER NOT NULL DEFAULT 0,
                email_verification_token        TEXT,
                email_verification_expires_at   TEXT,
                email_verification_attempts     INTEGER NOT NULL DEFAULT 0,
                created_at                      TEXT NOT NULL
            );

            CREATE TABLE pets (
                id              TEXT PRIMARY KEY,
                owner_id        TEXT NOT NULL REFERENCES users(id),
                name            TEXT NOT NULL,
                species         TEXT NOT NULL,
                breed           TEXT,
                age             INTEGER,
                gender          TEXT NOT NULL,
                color           TEXT,
                size            TEXT,
                temperament     TEXT,
                activity_level  TEXT,
                description     TEXT,
                is_adopted      INTEGER NOT NULL DEFAULT 0,
                images          TEXT NOT NULL DEFAULT '[]',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_pets_owner ON pets(owner_id);

            CREATE TABLE chats (
                id                  TEXT PRIMARY KEY,
                kind                TEXT NOT NULL,
                related_entity_id   TEXT,
                creator_id          TEXT NOT NULL REFERENCES users(id),
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_chats_entity ON chats(kind, related_entity_id);

            CREATE TABLE chat_members (
                id          TEXT PRIMARY KEY,
                chat_id     TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id),
                joined_at   TEXT NOT NULL,
                UNIQUE(chat_id, user_id)
            );

            CREATE TABLE chat_messages (
                id          TEXT PRIMARY KEY,
                chat_id     TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                sender_id   TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_chat_messages_chat ON chat_messages(chat_id, created_at);

            CREATE TABLE adoption_requests (
                id              TEXT PRIMARY KEY,
                pet_id          TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
                requester_id    TEXT NOT NULL REFERENCES users(id),
                chat_id         TEXT REFERENCES chats(id) ON DELETE SET NULL,
                description     TEXT,
                status          TEXT NOT NULL DEFAULT 'Pending',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_adoption_requests_chat ON adoption_requests(chat_id);

            CREATE TABLE rescue_reports (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                description TEXT,
                location    TEXT NOT NULL,
                latitude    REAL,
                longitude   REAL,
                photo       TEXT,
                status      TEXT NOT NULL DEFAULT 'Pending',
                alert_type  TEXT NOT NULL DEFAULT 'Medium',
                chat_id     TEXT REFERENCES chats(id) ON DELETE SET NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_rescue_reports_chat ON rescue_reports(chat_id);

            CREATE TABLE lost_found_reports (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                pet_name    TEXT,
                pet_type    TEXT,
                gender      TEXT NOT NULL DEFAULT 'Unknown',
                description TEXT,
                location    TEXT NOT NULL,
                latitude    REAL,
                longitude   REAL,
                photo       TEXT,
                status      TEXT NOT NULL DEFAULT 'Lost',
                chat_id     TEXT REFERENCES chats(id) ON DELETE SET NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_lost_found_reports_chat ON lost_found_reports(chat_id);

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                message     TEXT NOT NULL,
                kind        TEXT,
                chat_id     TEXT REFERENCES chats(id) ON DELETE SET NULL,
                report_id   TEXT,
                viewed      INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id);

            CREATE TABLE leaderboard_users (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                score               INTEGER NOT NULL DEFAULT 0,
                last_active         TEXT NOT NULL,
                rescues             INTEGER NOT NULL DEFAULT 0,
                adoptions           INTEGER NOT NULL DEFAULT 0,
                lost_pets           INTEGER NOT NULL DEFAULT 0,
                map_contributions   INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL
            );

            CREATE TABLE stray_map_entries (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                name            TEXT NOT NULL,
                description     TEXT,
                contact_info    TEXT,
                latitude        REAL NOT NULL,
                longitude       REAL NOT NULL,
                location_type   TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE products (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                description     TEXT,
                price_cents     INTEGER NOT NULL,
                stock           INTEGER NOT NULL DEFAULT 0,
                image_url       TEXT,
                affiliated_url  TEXT,
                is_active       INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE orders (
                id                  TEXT PRIMARY KEY,
                buyer_name          TEXT,
                buyer_phone         TEXT,
                total_cents         INTEGER NOT NULL DEFAULT 0,
                sent_to_whatsapp    INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL
            );

            CREATE TABLE order_items (
                id                  TEXT PRIMARY KEY,
                order_id            TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id          TEXT NOT NULL,
                product_name        TEXT NOT NULL,
                quantity            INTEGER NOT NULL DEFAULT 1,
                unit_price_cents    INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_order_items_order ON order_items(order_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
