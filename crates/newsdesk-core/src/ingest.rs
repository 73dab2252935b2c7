use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NewsdeskError, Result};
use crate::models::NewArticle;
use crate::store::{SqliteNewsStore, flatten_body_text};

const WORDS_PER_MINUTE: usize = 200;

/// One article at the ingestion boundary. Category slugs ride along with
/// the article; a slug seen for the first time creates its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub read_duration: Option<String>,
    #[serde(default = "empty_body")]
    pub body: serde_json::Value,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn empty_body() -> serde_json::Value {
    serde_json::json!({ "blocks": [] })
}

#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped_lines: usize,
    pub first_error: Option<(usize, String)>,
}

/// Line-tolerant JSONL import: malformed lines are skipped and counted,
/// storage failures abort. An input where every line is invalid is
/// reported as a validation error.
pub fn import_jsonl(store: &SqliteNewsStore, raw: &str) -> Result<ImportOutcome> {
    let mut outcome = ImportOutcome::default();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = match serde_json::from_str::<ArticleRecord>(line) {
            Ok(record) => record,
            Err(err) => {
                skip_line(&mut outcome, line_no + 1, err.to_string());
                continue;
            }
        };
        if record.title.trim().is_empty() {
            skip_line(
                &mut outcome,
                line_no + 1,
                "article title must not be empty".to_string(),
            );
            continue;
        }
        import_record(store, &record)?;
        outcome.imported += 1;
    }

    if outcome.imported == 0 && outcome.skipped_lines > 0 {
        return Err(all_lines_invalid(&outcome));
    }
    Ok(outcome)
}

pub fn import_record(store: &SqliteNewsStore, record: &ArticleRecord) -> Result<i64> {
    let now = Utc::now();
    let article = NewArticle {
        title: record.title.trim().to_string(),
        description: record.description.clone(),
        read_duration: record
            .read_duration
            .clone()
            .unwrap_or_else(|| derive_read_duration(&record.body)),
        body: record.body.clone(),
        created_at: record.created_at.unwrap_or(now),
        updated_at: now,
    };
    let article_id = store.insert_article(&article)?;

    for slug in &record.categories {
        let slug = slug.trim();
        if slug.is_empty() {
            continue;
        }
        let category_id = store.upsert_category(&derive_category_name(slug), slug)?;
        store.assign_category(article_id, category_id)?;
    }
    Ok(article_id)
}

fn skip_line(outcome: &mut ImportOutcome, line_no: usize, message: String) {
    outcome.skipped_lines += 1;
    if outcome.first_error.is_none() {
        outcome.first_error = Some((line_no, message));
    }
}

fn all_lines_invalid(outcome: &ImportOutcome) -> NewsdeskError {
    if let Some((line_no, message)) = outcome.first_error.as_ref() {
        return NewsdeskError::Validation(format!(
            "article import parse failed: skipped {} invalid lines (first at line {line_no}: {message})",
            outcome.skipped_lines
        ));
    }
    NewsdeskError::Validation(format!(
        "article import parse failed: skipped {} invalid lines",
        outcome.skipped_lines
    ))
}

fn derive_read_duration(body: &serde_json::Value) -> String {
    let words = flatten_body_text(body).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// "quantum-physics" -> "Quantum Physics"
fn derive_category_name(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::store::SqliteNewsStore;

    use super::{derive_category_name, derive_read_duration, import_jsonl};

    #[test]
    fn derive_category_name_title_cases_slug_words() {
        assert_eq!(derive_category_name("technology"), "Technology");
        assert_eq!(derive_category_name("quantum-physics"), "Quantum Physics");
        assert_eq!(derive_category_name("real_estate"), "Real Estate");
    }

    #[test]
    fn derive_read_duration_rounds_up_and_never_reports_zero() {
        assert_eq!(
            derive_read_duration(&serde_json::json!({ "blocks": [] })),
            "1 min read"
        );
        let long_text = vec!["word"; 401].join(" ");
        let body = serde_json::json!({
            "blocks": [{ "type": "paragraph", "data": { "text": long_text } }]
        });
        assert_eq!(derive_read_duration(&body), "3 min read");
    }

    #[test]
    fn import_jsonl_skips_bad_lines_and_imports_the_rest() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteNewsStore::open(temp.path().join("news.sqlite3")).expect("open");

        let raw = concat!(
            r#"{"title": "Grid Storage Milestone", "categories": ["technology"]}"#,
            "\n",
            "not json at all\n",
            r#"{"title": "   "}"#,
            "\n",
            r#"{"title": "Harvest Outlook Improves", "description": "Crop yields rebound."}"#,
            "\n",
        );
        let outcome = import_jsonl(&store, raw).expect("import");

        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped_lines, 2);
        let (line_no, _) = outcome.first_error.expect("first error");
        assert_eq!(line_no, 2);
        assert_eq!(store.article_count().expect("article count"), 2);
        assert_eq!(store.category_count().expect("category count"), 1);
    }

    #[test]
    fn import_jsonl_rejects_input_with_no_valid_lines() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteNewsStore::open(temp.path().join("news.sqlite3")).expect("open");

        let err = import_jsonl(&store, "garbage\n").expect_err("all lines invalid");
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }
}
