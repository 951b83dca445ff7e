use std::cmp::Ordering;

use recall_index::MetadataFilter;
use recall_store::StoreError;
use recall_types::{Category, MemoryEntry, ValidationError};
use tracing::warn;

use crate::error::ServiceResult;
use crate::service::MemoryService;

/// A semantic search request. Only `query` is required.
///
/// `project` and `category` narrow the candidate set inside the engine;
/// `tags` are intersected after hydration. `top_k` falls back to the
/// configured default and is clamped to the configured ceiling.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub project: Option<String>,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub include_outdated: bool,
    pub top_k: Option<usize>,
}

impl SearchRequest {
    /// Request with the given query text and every filter open.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// One scored search result, hydrated from the store.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub entry: MemoryEntry,
    /// Cosine similarity, higher is closer.
    pub score: f32,
}

impl MemoryService {
    /// Semantic search over the index, answered from the store.
    ///
    /// The engine only proposes candidates: every hit is re-read from the
    /// store before it is returned, so a stale index row can cost recall but
    /// never surface wrong data. Index unavailability is a real error here;
    /// there is no useful degraded form of semantic search.
    pub async fn search(&self, request: SearchRequest) -> ServiceResult<Vec<SearchHit>> {
        if request.query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let top_k = request
            .top_k
            .unwrap_or(self.config.default_top_k)
            .min(self.config.max_top_k);
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let deadline = self.op_deadline();

        let mut filter = MetadataFilter::new();
        if let Some(project) = &request.project {
            filter = filter.with("project", project.as_str());
        }
        if let Some(category) = request.category {
            filter = filter.with("category", category.as_str());
        }
        if !request.include_outdated {
            filter = filter.with("outdated", false);
        }

        // Over-fetch: hydration can drop candidates (vanished files, tag
        // filters, freshly outdated entries) and the page must survive that.
        let fetch = (top_k * 4).max(20);
        let candidates = self
            .index
            .query(&request.query, &filter, fetch, &deadline)
            .await?;

        let mut hits = Vec::with_capacity(top_k);
        for candidate in candidates {
            let entry = match self.store.load(candidate.id, &deadline).await {
                Ok(entry) => entry,
                Err(StoreError::NotFound(id)) => {
                    warn!(id = %id, "index row without a backing file; dropping hit");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if !request.include_outdated && entry.outdated {
                continue;
            }
            if !entry.has_all_tags(&request.tags) {
                continue;
            }
            hits.push(SearchHit {
                entry,
                score: candidate.score,
            });
        }

        // Best score first; equal scores resolve newest-first.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}
