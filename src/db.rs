use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "gradebook.sqlite3";

/// Opens (and creates if needed) the client-side store of a workspace.
/// Only the session credential lives here; entity data is never persisted.
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(workspace.join(DB_FILE_NAME))?;

    // Single-row table: at most one signed-in credential per workspace.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_credentials(
            id INTEGER PRIMARY KEY CHECK (id = 1),
            token TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn credential_get(conn: &Connection) -> anyhow::Result<Option<String>> {
    let token = conn
        .query_row(
            "SELECT token FROM session_credentials WHERE id = 1",
            [],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    Ok(token.filter(|t| !t.is_empty()))
}

pub fn credential_set(conn: &Connection, token: &str) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO session_credentials(id, token, updated_at) VALUES(1, ?, ?)
         ON CONFLICT(id) DO UPDATE SET token = excluded.token, updated_at = excluded.updated_at",
        (token, &now),
    )?;
    Ok(())
}

pub fn credential_clear(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("DELETE FROM session_credentials", [])?;
    Ok(())
}
