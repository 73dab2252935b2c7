use chrono::{DateTime, TimeZone, Utc};
use tempfile::tempdir;

use crate::models::NewArticle;
use crate::search::{CategoryScope, normalize_query};

use super::SqliteNewsStore;

fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn article(title: &str, description: Option<&str>, created_at: DateTime<Utc>) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        description: description.map(ToString::to_string),
        read_duration: "1 min read".to_string(),
        body: serde_json::json!({ "blocks": [] }),
        created_at,
        updated_at: created_at,
    }
}

fn open_store(path: &std::path::Path) -> SqliteNewsStore {
    SqliteNewsStore::open(path.join("news.sqlite3")).expect("open store")
}

#[test]
fn migration_is_idempotent_across_reopen() {
    let temp = tempdir().expect("tempdir");
    let db_path = temp.path().join("news.sqlite3");

    let store = SqliteNewsStore::open(&db_path).expect("first open");
    store
        .insert_article(&article("Reopen Probe", None, ts(1, 0)))
        .expect("insert");
    drop(store);

    let store = SqliteNewsStore::open(&db_path).expect("second open");
    assert_eq!(store.article_count().expect("count"), 1);
}

#[test]
fn insert_article_rejects_empty_title() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    let err = store
        .insert_article(&article("   ", None, ts(1, 0)))
        .expect_err("empty title");
    assert_eq!(err.code(), "VALIDATION_FAILED");
}

#[test]
fn lexical_match_reaches_the_page_through_the_fts_index() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());
    store
        .insert_article(&article(
            "Grid Storage Milestone",
            Some("Utility-scale batteries come online."),
            ts(1, 0),
        ))
        .expect("insert");

    let query = normalize_query(Some("batteries")).expect("query");
    let scope = CategoryScope::default();
    let hits = store
        .fetch_search_page(&query, &scope, 10, 0)
        .expect("page");

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.title, "Grid Storage Milestone");
    assert!(hit.lexical_rank.expect("lexical rank") > 0.0);
    assert_eq!(store.count_search_matches(&query, &scope).expect("count"), 1);
}

#[test]
fn removed_article_disappears_from_search() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());
    let id = store
        .insert_article(&article("Ephemeral Bulletin", None, ts(1, 0)))
        .expect("insert");

    let query = normalize_query(Some("ephemeral")).expect("query");
    let scope = CategoryScope::default();
    assert_eq!(store.count_search_matches(&query, &scope).expect("count"), 1);

    assert!(store.remove_article(id).expect("remove"));
    assert_eq!(store.count_search_matches(&query, &scope).expect("count"), 0);
    assert!(!store.remove_article(id).expect("second remove"));
}

#[test]
fn similarity_threshold_is_strictly_greater_than() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    // Against the operand "abcd" (3 bigrams), a title of "abcd" plus
    // fourteen `x`s scores exactly 2*3/(4+18-2) = 0.30; one `x` fewer
    // scores 6/19 > 0.30. Neither matches the lexical index.
    store
        .insert_article(&article("abcdxxxxxxxxxxxxxx", None, ts(1, 0)))
        .expect("insert at threshold");
    store
        .insert_article(&article("abcdxxxxxxxxxxxxx", None, ts(1, 1)))
        .expect("insert above threshold");

    let query = normalize_query(Some("abcd")).expect("query");
    let scope = CategoryScope::default();
    let hits = store
        .fetch_search_page(&query, &scope, 10, 0)
        .expect("page");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "abcdxxxxxxxxxxxxx");
    let fuzzy = hits[0].fuzzy_score.expect("fuzzy score");
    assert!((fuzzy - 6.0 / 19.0).abs() < 1e-9);
    assert_eq!(store.count_search_matches(&query, &scope).expect("count"), 1);
}

#[test]
fn category_name_similarity_includes_without_inflating_fuzzy_score() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    let id = store
        .insert_article(&article("Zzzz Yyyy", None, ts(1, 0)))
        .expect("insert");
    let category_id = store
        .upsert_category("Politics", "politics")
        .expect("category");
    store.assign_category(id, category_id).expect("assign");

    let query = normalize_query(Some("politics")).expect("query");
    let scope = CategoryScope::default();
    let hits = store
        .fetch_search_page(&query, &scope, 10, 0)
        .expect("page");

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.lexical_rank, Some(0.0));
    assert!(hit.fuzzy_score.expect("fuzzy score") <= 0.3);
    assert_eq!(hit.categories.len(), 1);
    assert_eq!(hit.categories[0].slug, "politics");
}

#[test]
fn lexical_candidates_get_boosted_and_capped_at_one() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    for i in 0..45 {
        store
            .insert_article(&article(
                &format!("Routine Market Note {i:02}"),
                None,
                ts(2, 0),
            ))
            .expect("insert filler");
    }
    store
        .insert_article(&NewArticle {
            title: "Perovskite Cell Efficiency Leap".to_string(),
            description: Some("Perovskite tandem cells break the lab record.".to_string()),
            read_duration: "1 min read".to_string(),
            body: serde_json::json!({
                "blocks": [{
                    "type": "paragraph",
                    "data": { "text": "Perovskite layers, perovskite stability, perovskite yield." }
                }]
            }),
            created_at: ts(3, 0),
            updated_at: ts(3, 0),
        })
        .expect("insert rare-term article");

    let query = normalize_query(Some("perovskite")).expect("query");
    let scope = CategoryScope::default();
    let hits = store
        .fetch_search_page(&query, &scope, 10, 0)
        .expect("page");

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert!(hit.weighted_score.expect("weighted score") > 1.0);
    assert!((hit.score.expect("combined score") - 1.0).abs() < 1e-9);
}

#[test]
fn fuzzy_only_candidates_keep_their_raw_similarity_unboosted() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());
    store
        .insert_article(&article("abcdxxxxxxxxxxxxx", None, ts(1, 0)))
        .expect("insert");

    let query = normalize_query(Some("abcd")).expect("query");
    let scope = CategoryScope::default();
    let hits = store
        .fetch_search_page(&query, &scope, 10, 0)
        .expect("page");

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.lexical_rank, Some(0.0));
    let fuzzy = hit.fuzzy_score.expect("fuzzy score");
    assert!((hit.score.expect("combined score") - fuzzy).abs() < 1e-12);
    let weighted = hit.weighted_score.expect("weighted score");
    assert!((weighted - fuzzy * 0.3).abs() < 1e-12);
}

#[test]
fn scope_restricts_both_page_and_count_identically() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    let tech = store
        .upsert_category("Technology", "technology")
        .expect("tech category");
    let science = store
        .upsert_category("Science", "science")
        .expect("science category");

    let a = store
        .insert_article(&article("Quantum Computer Sets Record", None, ts(1, 0)))
        .expect("insert a");
    let b = store
        .insert_article(&article("Quantum Physics Breakthrough", None, ts(2, 0)))
        .expect("insert b");
    store.assign_category(a, tech).expect("assign a");
    store.assign_category(b, science).expect("assign b");

    let query = normalize_query(Some("quantum")).expect("query");

    let universal = CategoryScope::default();
    assert_eq!(
        store
            .count_search_matches(&query, &universal)
            .expect("count"),
        2
    );

    let science_only = CategoryScope::parse(Some("science"));
    let hits = store
        .fetch_search_page(&query, &science_only, 10, 0)
        .expect("page");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Quantum Physics Breakthrough");
    assert_eq!(
        store
            .count_search_matches(&query, &science_only)
            .expect("count"),
        1
    );
}

#[test]
fn recent_page_orders_by_creation_time_descending() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    store
        .insert_article(&article("Oldest", None, ts(1, 0)))
        .expect("insert oldest");
    store
        .insert_article(&article("Middle", None, ts(2, 0)))
        .expect("insert middle");
    store
        .insert_article(&article("Newest", None, ts(3, 0)))
        .expect("insert newest");

    let scope = CategoryScope::default();
    let hits = store.fetch_recent_page(&scope, 10, 0).expect("page");
    let titles = hits.iter().map(|hit| hit.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, ["Newest", "Middle", "Oldest"]);
    assert!(hits.iter().all(|hit| hit.score.is_none()));
    assert_eq!(store.count_articles_in_scope(&scope).expect("count"), 3);
}

#[test]
fn uncategorized_articles_carry_an_empty_category_list() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());
    store
        .insert_article(&article("Standalone Dispatch", None, ts(1, 0)))
        .expect("insert");

    let scope = CategoryScope::default();
    let hits = store.fetch_recent_page(&scope, 10, 0).expect("page");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].categories.is_empty());
}

#[test]
fn assigning_the_same_category_twice_keeps_membership_unique() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());

    let id = store
        .insert_article(&article("Single Membership", None, ts(1, 0)))
        .expect("insert");
    let category_id = store
        .upsert_category("Business", "business")
        .expect("category");
    store.assign_category(id, category_id).expect("first");
    store.assign_category(id, category_id).expect("second");

    let scope = CategoryScope::default();
    let hits = store.fetch_recent_page(&scope, 10, 0).expect("page");
    assert_eq!(hits[0].categories.len(), 1);
}

#[test]
fn malformed_lexical_expression_propagates_as_query_error() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());
    store
        .insert_article(&article("Any Document", None, ts(1, 0)))
        .expect("insert");

    let query = normalize_query(Some("\"unbalanced")).expect("query");
    let scope = CategoryScope::default();
    let err = store
        .fetch_search_page(&query, &scope, 10, 0)
        .expect_err("fts syntax error");
    assert_eq!(err.code(), "SQLITE_ERROR");
}
