use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use crate::error::{NewsdeskError, Result};
use crate::models::{Pagination, RequestLogEntry, SearchHit, SearchPage, SearchRequest};
use crate::search::{
    CategoryScope, NormalizedQuery, PageParams, normalize_query, total_pages,
};

use super::Newsdesk;

impl Newsdesk {
    /// One search request end to end: coerce page/limit, parse the
    /// category scope, normalize the query, then run either the hybrid
    /// scorer or the recency fallback. The outcome is logged either way.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let params = PageParams::resolve(
            request.page.as_deref(),
            request.limit.as_deref(),
            &self.config,
        );
        let scope = CategoryScope::parse(request.categories.as_deref());
        let normalized = normalize_query(request.q.as_deref());
        let mode = if normalized.is_some() {
            "hybrid"
        } else {
            "recent"
        };

        let output = match normalized.as_ref() {
            Some(query) => self.run_hybrid_page(query, &scope, params),
            None => self.run_recent_page(&scope, params),
        };

        match output {
            Ok(page) => {
                self.try_log_request(&RequestLogEntry {
                    request_id,
                    operation: "search".to_string(),
                    status: "ok".to_string(),
                    latency_ms: started.elapsed().as_millis(),
                    created_at: Utc::now().to_rfc3339(),
                    error_code: None,
                    error_message: None,
                    details: Some(json!({
                        "query": request.q,
                        "categories": request.categories,
                        "mode": mode,
                        "page": page.pagination.page,
                        "limit": page.pagination.limit,
                        "total": page.pagination.total,
                        "result_count": page.data.len(),
                    })),
                });
                Ok(page)
            }
            Err(err) => {
                self.try_log_request(&RequestLogEntry {
                    request_id,
                    operation: "search".to_string(),
                    status: "error".to_string(),
                    latency_ms: started.elapsed().as_millis(),
                    created_at: Utc::now().to_rfc3339(),
                    error_code: Some(err.code().to_string()),
                    error_message: Some(err.to_string()),
                    details: Some(json!({
                        "query": request.q,
                        "categories": request.categories,
                        "mode": mode,
                    })),
                });
                Err(err)
            }
        }
    }

    /// Fixed fan-out/fan-in of exactly two read sub-operations: the scored
    /// page and the exact count for the identical predicate. Each worker
    /// acquires its own read connection and releases it on completion; a
    /// failure on either side aborts the whole request.
    fn run_hybrid_page(
        &self,
        query: &NormalizedQuery,
        scope: &CategoryScope,
        params: PageParams,
    ) -> Result<SearchPage> {
        let offset = params.offset();
        let (data, total) = std::thread::scope(|workers| -> Result<(Vec<SearchHit>, usize)> {
            let page_task =
                workers.spawn(|| self.state.fetch_search_page(query, scope, params.limit, offset));
            let count_task = workers.spawn(|| self.state.count_search_matches(query, scope));
            let data = join_worker(page_task, "search page")?;
            let total = join_worker(count_task, "search count")?;
            Ok((data, total))
        })?;
        Ok(assemble_page(data, total, params))
    }

    fn run_recent_page(&self, scope: &CategoryScope, params: PageParams) -> Result<SearchPage> {
        let offset = params.offset();
        let (data, total) = std::thread::scope(|workers| -> Result<(Vec<SearchHit>, usize)> {
            let page_task =
                workers.spawn(|| self.state.fetch_recent_page(scope, params.limit, offset));
            let count_task = workers.spawn(|| self.state.count_articles_in_scope(scope));
            let data = join_worker(page_task, "recent page")?;
            let total = join_worker(count_task, "recent count")?;
            Ok((data, total))
        })?;
        Ok(assemble_page(data, total, params))
    }
}

fn join_worker<T>(
    handle: std::thread::ScopedJoinHandle<'_, Result<T>>,
    label: &str,
) -> Result<T> {
    handle
        .join()
        .map_err(|_| NewsdeskError::Internal(format!("{label} worker panicked")))?
}

fn assemble_page(data: Vec<SearchHit>, total: usize, params: PageParams) -> SearchPage {
    SearchPage {
        data,
        pagination: Pagination {
            page: params.page,
            limit: params.limit,
            total,
            total_pages: total_pages(total, params.limit),
        },
    }
}
