use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::models::{CorpusStatus, RequestLogEntry};
use crate::store::SqliteNewsStore;

mod search_service;

/// Client handle over one corpus directory: the SQLite store plus the
/// request log living beside it.
#[derive(Clone)]
pub struct Newsdesk {
    pub state: SqliteNewsStore,
    config: SearchConfig,
    request_log_path: PathBuf,
}

impl std::fmt::Debug for Newsdesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Newsdesk").finish_non_exhaustive()
    }
}

impl Newsdesk {
    pub fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(root_dir, SearchConfig::from_env())
    }

    pub fn open_with_config(root_dir: impl Into<PathBuf>, config: SearchConfig) -> Result<Self> {
        let root = root_dir.into();
        std::fs::create_dir_all(&root)?;
        let state = SqliteNewsStore::open(root.join("newsdesk.sqlite3"))?;
        Ok(Self {
            state,
            config,
            request_log_path: root.join("request_log.jsonl"),
        })
    }

    pub fn status(&self) -> Result<CorpusStatus> {
        Ok(CorpusStatus {
            articles: self.state.article_count()?,
            categories: self.state.category_count()?,
        })
    }

    /// Best-effort request log append; logging failures never fail the
    /// request being logged.
    pub(crate) fn try_log_request(&self, entry: &RequestLogEntry) {
        let Ok(mut line) = serde_json::to_string(entry) else {
            return;
        };
        line.push('\n');
        let _ = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.request_log_path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
    }
}
