//! Table definitions and additive migrations, applied idempotently on every
//! startup.

use rusqlite::Connection;

/// Create every table if missing, then bring an existing database forward
/// through any additive migrations it predates.
pub(crate) fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    create_base_tables(conn)?;
    run_migrations(conn)?;
    Ok(())
}

fn create_base_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id                  TEXT PRIMARY KEY,
            guild_id            TEXT,
            channel_id          TEXT NOT NULL,
            bot_id              TEXT NOT NULL,
            enable_rag          INTEGER NOT NULL DEFAULT 0,
            message_count       INTEGER NOT NULL DEFAULT 0,
            summary_updated_at  TEXT,
            memory_flush_at     TEXT,
            created_at          TEXT NOT NULL,
            last_active         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id  TEXT NOT NULL,
            user_id     TEXT NOT NULL,
            username    TEXT,
            role        TEXT NOT NULL CHECK(role IN ('user','assistant','system','tool')),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);

        CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id  TEXT,
            channel_id  TEXT,
            prompt      TEXT NOT NULL,
            cron_expr   TEXT,
            enabled     INTEGER NOT NULL DEFAULT 1,
            last_run    TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS structured_audit (
            session_id      TEXT NOT NULL,
            seq             INTEGER NOT NULL,
            event_type      TEXT NOT NULL,
            timestamp       TEXT NOT NULL,
            run_id          TEXT NOT NULL,
            parent_run_id   TEXT,
            payload         TEXT NOT NULL,
            wire_prev_hash  TEXT NOT NULL,
            wire_hash       TEXT NOT NULL,
            PRIMARY KEY (session_id, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_audit_type ON structured_audit(session_id, event_type);

        CREATE TABLE IF NOT EXISTS approvals (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id    TEXT NOT NULL,
            tool_call_id  TEXT NOT NULL,
            action        TEXT NOT NULL,
            approved      INTEGER NOT NULL,
            approved_by   TEXT NOT NULL,
            method        TEXT NOT NULL CHECK(method IN ('policy','interactive','cli')),
            policy_name   TEXT,
            timestamp     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_approvals_timestamp ON approvals(timestamp DESC);",
    )
}

/// Additive column adds, guarded by `PRAGMA user_version` so each migration
/// runs exactly once no matter how many times `initialize` is called.
fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version < 1 {
        conn.execute_batch(
            "ALTER TABLE sessions ADD COLUMN model TEXT;
             ALTER TABLE sessions ADD COLUMN session_summary TEXT;
             ALTER TABLE sessions ADD COLUMN compaction_count INTEGER NOT NULL DEFAULT 0;
             ALTER TABLE tasks ADD COLUMN run_at TEXT;
             ALTER TABLE tasks ADD COLUMN every_ms INTEGER;
             PRAGMA user_version = 1;",
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn migrated_columns_exist() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        conn.execute(
            "INSERT INTO sessions (id, channel_id, bot_id, model, session_summary, \
             compaction_count, created_at, last_active) \
             VALUES ('s1', 'c1', 'bot', 'gpt', 'summary', 2, 'now', 'now')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks (session_id, channel_id, prompt, run_at, every_ms, created_at) \
             VALUES ('s1', 'c1', 'ping', '2030-01-01T00:00:00Z', 60000, 'now')",
            [],
        )
        .unwrap();
    }
}
