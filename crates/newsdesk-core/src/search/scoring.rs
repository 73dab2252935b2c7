//! Single source of the hybrid inclusion predicate and scoring expressions.
//!
//! The storage adapter composes both the result-page query and the
//! total-count query from these fragments. Keeping one construction path is
//! what guarantees `total` always reflects the same predicate as the
//! returned rows.
//!
//! Parameter layout for hybrid queries: `?1` is the lexical (FTS5 MATCH)
//! expression, `?2` the fuzzy operand, `?3..` the category slugs.

pub(crate) const WEIGHT_LEXICAL: f64 = 0.7;
pub(crate) const WEIGHT_FUZZY: f64 = 0.3;
pub(crate) const LEXICAL_BOOST: f64 = 1.5;
pub(crate) const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Candidate row source: every article, left-joined against the set of
/// lexical matches so fuzzy-only candidates keep a NULL (= 0) rank.
/// `bm25()` scores lower-is-better as a negative value; negating and
/// flooring at zero yields the non-negative "0 means no match" rank the
/// scorer expects even for terms present in every document.
#[must_use]
pub(crate) fn candidate_source_sql() -> String {
    r"
    FROM articles a
    LEFT JOIN (
        SELECT rowid AS article_id, MAX(-bm25(articles_fts), 0.0) AS lexical_rank
        FROM articles_fts
        WHERE articles_fts MATCH ?1
    ) lex ON lex.article_id = a.id
    "
    .to_string()
}

/// A document is a candidate iff it matches lexically, or title /
/// description / any associated category name clears the similarity
/// threshold (strict `>`).
#[must_use]
pub(crate) fn inclusion_predicate_sql() -> String {
    format!(
        r"
        (
            lex.article_id IS NOT NULL
            OR similarity(a.title, ?2) > {SIMILARITY_THRESHOLD}
            OR similarity(COALESCE(a.description, ''), ?2) > {SIMILARITY_THRESHOLD}
            OR EXISTS (
                SELECT 1
                FROM article_categories m
                JOIN categories c ON c.id = m.category_id
                WHERE m.article_id = a.id
                  AND similarity(c.name, ?2) > {SIMILARITY_THRESHOLD}
            )
        )
        "
    )
}

/// Membership restriction shared by the hybrid and recency paths. Returns
/// an empty string for the universal scope.
#[must_use]
pub(crate) fn scope_predicate_sql(first_param: usize, slug_count: usize) -> String {
    if slug_count == 0 {
        return String::new();
    }
    let placeholders = (first_param..first_param + slug_count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r"
        EXISTS (
            SELECT 1
            FROM article_categories m
            JOIN categories c ON c.id = m.category_id
            WHERE m.article_id = a.id
              AND c.slug IN ({placeholders})
        )
        "
    )
}

/// Inner projection of the two raw signals. Category-name similarity feeds
/// inclusion only and deliberately stays out of `fuzzy_score`.
#[must_use]
pub(crate) fn signal_projection_sql() -> String {
    r"
    COALESCE(lex.lexical_rank, 0.0) AS lexical_rank,
    MAX(
        similarity(a.title, ?2),
        similarity(COALESCE(a.description, ''), ?2)
    ) AS fuzzy_score
    "
    .to_string()
}

/// Outer projection blending the signals. `weighted_score` is the sort
/// key; `score` is the boosted, ceiling-capped relevance returned to
/// callers. Fuzzy-only rows keep their raw similarity unboosted.
#[must_use]
pub(crate) fn blended_projection_sql() -> String {
    format!(
        r"
    s.lexical_rank * {WEIGHT_LEXICAL} + s.fuzzy_score * {WEIGHT_FUZZY} AS weighted_score,
    CASE
        WHEN s.lexical_rank > 0.0 THEN MIN(
            (s.lexical_rank * {WEIGHT_LEXICAL} + s.fuzzy_score * {WEIGHT_FUZZY}) * {LEXICAL_BOOST},
            1.0
        )
        ELSE s.fuzzy_score
    END AS score
    "
    )
}

pub(crate) const RANKED_ORDER_SQL: &str =
    "ORDER BY weighted_score DESC, s.created_at DESC, s.id ASC";

pub(crate) const RECENT_ORDER_SQL: &str = "ORDER BY a.created_at DESC, a.id ASC";

#[cfg(test)]
mod tests {
    use super::{inclusion_predicate_sql, scope_predicate_sql};

    #[test]
    fn inclusion_threshold_is_strict() {
        let predicate = inclusion_predicate_sql();
        assert_eq!(predicate.matches("> 0.3").count(), 3);
        assert!(!predicate.contains(">= 0.3"));
    }

    #[test]
    fn scope_predicate_is_empty_for_universal_scope() {
        assert!(scope_predicate_sql(3, 0).is_empty());
    }

    #[test]
    fn scope_predicate_numbers_placeholders_from_first_param() {
        let predicate = scope_predicate_sql(3, 2);
        assert!(predicate.contains("c.slug IN (?3, ?4)"));
    }
}
