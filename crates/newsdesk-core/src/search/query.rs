/// Two derived values from one trimmed input string: the conjunctive
/// expression handed to the lexical index and the verbatim operand handed
/// to the similarity primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub fts_expression: String,
    pub fuzzy_operand: String,
}

/// Trims the raw query; whitespace-only input means "no search query" and
/// routes the request to the recency listing instead of the scorer. No
/// stemming, stop words, or escaping happens here; syntax the lexical
/// engine rejects surfaces as a query-execution error downstream.
#[must_use]
pub fn normalize_query(raw: Option<&str>) -> Option<NormalizedQuery> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(NormalizedQuery {
        fts_expression: trimmed.split_whitespace().collect::<Vec<_>>().join(" AND "),
        fuzzy_operand: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_query;

    #[test]
    fn absent_and_blank_queries_normalize_to_none() {
        assert!(normalize_query(None).is_none());
        assert!(normalize_query(Some("")).is_none());
        assert!(normalize_query(Some("   \t\n ")).is_none());
    }

    #[test]
    fn whitespace_runs_collapse_into_conjunctions() {
        let query = normalize_query(Some("  quantum   computing\trecord ")).expect("normalized");
        assert_eq!(query.fts_expression, "quantum AND computing AND record");
        assert_eq!(query.fuzzy_operand, "quantum   computing\trecord");
    }

    #[test]
    fn single_term_stays_unconjoined() {
        let query = normalize_query(Some("quantum")).expect("normalized");
        assert_eq!(query.fts_expression, "quantum");
        assert_eq!(query.fuzzy_operand, "quantum");
    }
}
