use rusqlite::Connection;

use crate::error::Result;

use super::SqliteNewsStore;

const MIGRATION_SCHEMA_SQL: &str = r"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        read_duration TEXT NOT NULL,
        body_json TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_articles_created_at
    ON articles(created_at DESC);

    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS article_categories (
        article_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        PRIMARY KEY (article_id, category_id),
        FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
        FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
    );
";

impl SqliteNewsStore {
    pub(super) fn migrate(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATION_SCHEMA_SQL)?;
            if !has_table(conn, "articles_fts")? {
                conn.execute(
                    r"
                    CREATE VIRTUAL TABLE articles_fts
                    USING fts5(
                        title,
                        description,
                        body_text,
                        tokenize='unicode61 remove_diacritics 2'
                    )
                    ",
                    [],
                )?;
                conn.execute(
                    r"
                    INSERT INTO articles_fts(rowid, title, description, body_text)
                    SELECT id, title, COALESCE(description, ''), ''
                    FROM articles
                    ",
                    [],
                )?;
            }
            Ok(())
        })
    }
}

fn has_table(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
