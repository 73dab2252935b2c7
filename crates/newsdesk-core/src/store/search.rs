use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::params_from_iter;

use crate::error::Result;
use crate::models::{CategoryRef, SearchHit};
use crate::search::scoring;
use crate::search::{CategoryScope, NormalizedQuery};

use super::SqliteNewsStore;

impl SqliteNewsStore {
    /// One page of hybrid-scored candidates. Composed from the same
    /// predicate fragments as `count_search_matches`; only the projection,
    /// ordering, and window differ.
    pub fn fetch_search_page(
        &self,
        query: &NormalizedQuery,
        scope: &CategoryScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>> {
        let slug_count = scope.slugs().len();
        let limit_param = 3 + slug_count;
        let offset_param = limit_param + 1;
        let sql = format!(
            r"
            SELECT
              s.id,
              s.title,
              s.description,
              s.read_duration,
              s.created_at,
              s.updated_at,
              s.categories_json,
              s.lexical_rank,
              s.fuzzy_score,
              {blended}
            FROM (
                SELECT
                  a.id,
                  a.title,
                  a.description,
                  a.read_duration,
                  a.created_at,
                  a.updated_at,
                  {categories} AS categories_json,
                  {signals}
                {source}
                WHERE {inclusion}{scope_clause}
            ) s
            {order}
            LIMIT ?{limit_param} OFFSET ?{offset_param}
            ",
            blended = scoring::blended_projection_sql(),
            categories = categories_json_sql(),
            signals = scoring::signal_projection_sql(),
            source = scoring::candidate_source_sql(),
            inclusion = scoring::inclusion_predicate_sql(),
            scope_clause = and_scope_clause(scope, 3),
            order = scoring::RANKED_ORDER_SQL,
        );

        let mut values = hybrid_params(query, scope);
        values.push(Value::Integer(usize_to_i64_saturating(limit.max(1))));
        values.push(Value::Integer(usize_to_i64_saturating(offset)));

        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            let created_raw = row.get::<_, String>(4)?;
            let updated_raw = row.get::<_, String>(5)?;
            let categories_raw = row.get::<_, String>(6)?;
            Ok(SearchHit {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                read_duration: row.get(3)?,
                created_at: parse_required_rfc3339(4, &created_raw)?,
                updated_at: parse_required_rfc3339(5, &updated_raw)?,
                categories: parse_category_list(6, &categories_raw)?,
                lexical_rank: Some(row.get::<_, f64>(7)?),
                fuzzy_score: Some(row.get::<_, f64>(8)?),
                weighted_score: Some(row.get::<_, f64>(9)?),
                score: Some(row.get::<_, f64>(10)?),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Exact number of corpus documents satisfying the identical inclusion
    /// and scope predicates as the page query. No scoring, no window.
    pub fn count_search_matches(
        &self,
        query: &NormalizedQuery,
        scope: &CategoryScope,
    ) -> Result<usize> {
        let sql = format!(
            r"
            SELECT COUNT(*)
            {source}
            WHERE {inclusion}{scope_clause}
            ",
            source = scoring::candidate_source_sql(),
            inclusion = scoring::inclusion_predicate_sql(),
            scope_clause = and_scope_clause(scope, 3),
        );

        let values = hybrid_params(query, scope);
        let conn = self.read_conn()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(i64_to_usize_saturating(count))
    }

    /// Recency listing for requests without query text: scope predicate
    /// only, newest first, no score columns.
    pub fn fetch_recent_page(
        &self,
        scope: &CategoryScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>> {
        let slug_count = scope.slugs().len();
        let limit_param = 1 + slug_count;
        let offset_param = limit_param + 1;
        let sql = format!(
            r"
            SELECT
              a.id,
              a.title,
              a.description,
              a.read_duration,
              a.created_at,
              a.updated_at,
              {categories} AS categories_json
            FROM articles a
            {scope_clause}
            {order}
            LIMIT ?{limit_param} OFFSET ?{offset_param}
            ",
            categories = categories_json_sql(),
            scope_clause = where_scope_clause(scope, 1),
            order = scoring::RECENT_ORDER_SQL,
        );

        let mut values = scope_params(scope);
        values.push(Value::Integer(usize_to_i64_saturating(limit.max(1))));
        values.push(Value::Integer(usize_to_i64_saturating(offset)));

        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            let created_raw = row.get::<_, String>(4)?;
            let updated_raw = row.get::<_, String>(5)?;
            let categories_raw = row.get::<_, String>(6)?;
            Ok(SearchHit {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                read_duration: row.get(3)?,
                created_at: parse_required_rfc3339(4, &created_raw)?,
                updated_at: parse_required_rfc3339(5, &updated_raw)?,
                categories: parse_category_list(6, &categories_raw)?,
                lexical_rank: None,
                fuzzy_score: None,
                weighted_score: None,
                score: None,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count_articles_in_scope(&self, scope: &CategoryScope) -> Result<usize> {
        let sql = format!(
            r"
            SELECT COUNT(*)
            FROM articles a
            {scope_clause}
            ",
            scope_clause = where_scope_clause(scope, 1),
        );

        let values = scope_params(scope);
        let conn = self.read_conn()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(i64_to_usize_saturating(count))
    }
}

/// Category list aggregated per row, name-ordered, `[]` for articles
/// without memberships.
fn categories_json_sql() -> &'static str {
    r"(
        SELECT json_group_array(json_object('id', c.id, 'name', c.name, 'slug', c.slug))
        FROM (
            SELECT c2.id, c2.name, c2.slug
            FROM article_categories m
            JOIN categories c2 ON c2.id = m.category_id
            WHERE m.article_id = a.id
            ORDER BY c2.name ASC, c2.id ASC
        ) c
    )"
}

fn and_scope_clause(scope: &CategoryScope, first_param: usize) -> String {
    if scope.is_empty() {
        return String::new();
    }
    format!(
        " AND {}",
        scoring::scope_predicate_sql(first_param, scope.slugs().len())
    )
}

fn where_scope_clause(scope: &CategoryScope, first_param: usize) -> String {
    if scope.is_empty() {
        return String::new();
    }
    format!(
        "WHERE {}",
        scoring::scope_predicate_sql(first_param, scope.slugs().len())
    )
}

fn hybrid_params(query: &NormalizedQuery, scope: &CategoryScope) -> Vec<Value> {
    let mut values = vec![
        Value::Text(query.fts_expression.clone()),
        Value::Text(query.fuzzy_operand.clone()),
    ];
    values.extend(scope_params(scope));
    values
}

fn scope_params(scope: &CategoryScope) -> Vec<Value> {
    scope
        .slugs()
        .iter()
        .map(|slug| Value::Text(slug.clone()))
        .collect()
}

fn parse_required_rfc3339(idx: usize, raw: &str) -> rusqlite::Result<chrono::DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|x| x.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_category_list(idx: usize, raw: &str) -> rusqlite::Result<Vec<CategoryRef>> {
    serde_json::from_str::<Vec<CategoryRef>>(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn usize_to_i64_saturating(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn i64_to_usize_saturating(value: i64) -> usize {
    if value <= 0 {
        0
    } else {
        usize::try_from(value).unwrap_or(usize::MAX)
    }
}
