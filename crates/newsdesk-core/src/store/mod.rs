use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags, params};

use crate::error::{NewsdeskError, Result};
use crate::models::NewArticle;

mod migration;
mod search;
mod similarity;

pub use similarity::bigram_similarity;

/// SQLite adapter owning the corpus tables, the FTS5 lexical index, and
/// the registered `similarity()` scalar. Writes happen only at the
/// ingestion boundary; the search paths are read-only.
#[derive(Clone)]
pub struct SqliteNewsStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteNewsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteNewsStore").finish_non_exhaustive()
    }
}

impl SqliteNewsStore {
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| NewsdeskError::mutex_poisoned("sqlite"))?;
        f(&conn)
    }

    fn with_tx<T>(&self, f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| NewsdeskError::mutex_poisoned("sqlite"))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        drop(conn);
        Ok(value)
    }

    /// Dedicated read-only connection for one search sub-operation. The
    /// page and count queries of a request each open their own so the two
    /// can run concurrently; the connection drops at sub-operation end.
    pub(crate) fn read_conn(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        similarity::register(&conn)?;
        Ok(conn)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        similarity::register(&conn)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_path_buf(),
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn insert_article(&self, article: &NewArticle) -> Result<i64> {
        if article.title.trim().is_empty() {
            return Err(NewsdeskError::Validation(
                "article title must not be empty".to_string(),
            ));
        }
        let body_json = serde_json::to_string(&article.body)?;
        let body_text = flatten_body_text(&article.body);
        self.with_tx(|tx| {
            tx.execute(
                r"
                INSERT INTO articles(
                    title, description, read_duration, body_json, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    article.title.as_str(),
                    article.description.as_deref(),
                    article.read_duration.as_str(),
                    body_json,
                    article.created_at.to_rfc3339(),
                    article.updated_at.to_rfc3339(),
                ],
            )?;
            let article_id = tx.last_insert_rowid();
            tx.execute(
                r"
                INSERT INTO articles_fts(rowid, title, description, body_text)
                VALUES (?1, ?2, ?3, ?4)
                ",
                params![
                    article_id,
                    article.title.as_str(),
                    article.description.as_deref().unwrap_or(""),
                    body_text,
                ],
            )?;
            Ok(article_id)
        })
    }

    pub fn remove_article(&self, article_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            tx.execute(
                "DELETE FROM articles_fts WHERE rowid = ?1",
                params![article_id],
            )?;
            let affected = tx.execute("DELETE FROM articles WHERE id = ?1", params![article_id])?;
            Ok(affected > 0)
        })
    }

    pub fn upsert_category(&self, name: &str, slug: &str) -> Result<i64> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(NewsdeskError::Validation(
                "category slug must not be empty".to_string(),
            ));
        }
        self.with_conn(|conn| {
            conn.execute(
                r"
                INSERT INTO categories(name, slug)
                VALUES (?1, ?2)
                ON CONFLICT(slug) DO UPDATE SET name = excluded.name
                ",
                params![name, slug],
            )?;
            let category_id = conn.query_row(
                "SELECT id FROM categories WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )?;
            Ok(category_id)
        })
    }

    /// Membership is a set: re-assigning an existing pair is a no-op.
    pub fn assign_category(&self, article_id: i64, category_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r"
                INSERT OR IGNORE INTO article_categories(article_id, category_id)
                VALUES (?1, ?2)
                ",
                params![article_id, category_id],
            )?;
            Ok(())
        })
    }

    pub fn article_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
            Ok(i64_to_usize_saturating(count))
        })
    }

    pub fn category_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
            Ok(i64_to_usize_saturating(count))
        })
    }
}

/// Collects every string value in the opaque body document, in order. The
/// block structure itself is never interpreted; this only feeds the
/// lexical index and the read-duration estimate.
pub(crate) fn flatten_body_text(body: &serde_json::Value) -> String {
    let mut out = String::new();
    collect_text(body, &mut out);
    out
}

fn collect_text(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::String(text) => {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(text);
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

fn i64_to_usize_saturating(value: i64) -> usize {
    if value <= 0 {
        0
    } else {
        usize::try_from(value).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests;
