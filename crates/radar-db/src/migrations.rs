use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS investments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            type            TEXT NOT NULL,
            location        TEXT NOT NULL,
            lat             REAL,
            lng             REAL,
            likes           INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
            author_name     TEXT NOT NULL,
            author_address  TEXT NOT NULL,
            approved        INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_investments_likes
            ON investments(approved, likes DESC);

        CREATE TABLE IF NOT EXISTS finished_investments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            budget          INTEGER NOT NULL,
            completed       INTEGER NOT NULL DEFAULT 0,
            region          TEXT NOT NULL,
            type            TEXT NOT NULL,
            location        TEXT NOT NULL,
            lat             REAL,
            lng             REAL,
            completed_date  TEXT NOT NULL,
            contractor      TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
