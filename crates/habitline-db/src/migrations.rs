use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 3;

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
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE habits (
                id               TEXT PRIMARY KEY,
                user_id          TEXT NOT NULL REFERENCES users(id),
                name             TEXT NOT NULL,
                category         TEXT NOT NULL DEFAULT 'other',
                frequency        TEXT NOT NULL DEFAULT 'daily',
                description      TEXT,
                is_active        INTEGER NOT NULL DEFAULT 1,
                reminder_enabled INTEGER NOT NULL DEFAULT 1,
                reminder_time    TEXT,
                reminder_sent    INTEGER NOT NULL DEFAULT 0,
                created_at       TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Names only need to be unique among a user's live habits
            CREATE UNIQUE INDEX idx_habits_active_name
                ON habits(user_id, name) WHERE is_active = 1;

            CREATE TABLE check_ins (
                id          TEXT PRIMARY KEY,
                habit_id    TEXT NOT NULL REFERENCES habits(id),
                user_id     TEXT NOT NULL REFERENCES users(id),
                date        TEXT NOT NULL,
                completed   INTEGER NOT NULL DEFAULT 1,
                notes       TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(habit_id, date)
            );

            CREATE INDEX idx_check_ins_user_date
                ON check_ins(user_id, date DESC);

            CREATE TABLE follows (
                id           TEXT PRIMARY KEY,
                follower_id  TEXT NOT NULL REFERENCES users(id),
                following_id TEXT NOT NULL REFERENCES users(id),
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(follower_id, following_id),
                CHECK(follower_id != following_id)
            );

            CREATE INDEX idx_follows_following
                ON follows(following_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (verification codes)");
        conn.execute_batch(
            "
            CREATE TABLE otps (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                code_hash   TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_otps_user ON otps(user_id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    if version < 3 {
        info!("Running migration v3 (reminder sent day)");
        // Replaces the reminder_sent flag, which is no longer read
        conn.execute_batch(
            "
            ALTER TABLE habits ADD COLUMN reminder_sent_on TEXT;

            INSERT INTO schema_version (version) VALUES (3);
            ",
        )?;
    }

    Ok(())
}
