//! Lesson loading and caching
//!
//! Lookup order: in-memory cache, then documents embedded at startup (for
//! example from a local file), then the remote source. Normalized lessons are
//! cached by id for the lifetime of the fetcher.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::model::Lesson;
use super::normalize::normalize;
use crate::api::ApiError;

/// Somewhere lesson documents can be fetched from
pub trait LessonSource: Send + Sync {
    /// Fetch the raw document; `Ok(None)` means it does not exist
    fn fetch_document<'a>(&'a self, lesson_id: &'a str)
    -> BoxFuture<'a, Result<Option<Value>, ApiError>>;
}

/// Loads, normalizes and caches lessons
#[derive(Default)]
pub struct LessonFetcher {
    /// Remote source, if any
    source: Option<Arc<dyn LessonSource>>,
    /// Raw documents provided up front, keyed by lesson id
    embedded: HashMap<String, Value>,
    /// Normalized lessons
    cache: HashMap<String, Arc<Lesson>>,
}

impl LessonFetcher {
    /// Create a fetcher backed by a remote source
    pub fn new(source: Arc<dyn LessonSource>) -> Self {
        Self { source: Some(source), ..Default::default() }
    }

    /// Create a fetcher that only knows embedded documents
    pub fn offline() -> Self {
        Self::default()
    }

    /// Provide a raw document up front. Returns the id it was registered under.
    pub fn embed(&mut self, document: Value) -> Result<String, ApiError> {
        let id = match document.get("id") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(ApiError::Validation("embedded lesson has no id".to_string())),
        };
        self.embedded.insert(id.clone(), document);
        Ok(id)
    }

    /// Whether a lesson is already cached
    pub fn is_cached(&self, lesson_id: &str) -> bool {
        self.cache.contains_key(lesson_id)
    }

    /// Fetch a lesson by id
    pub async fn fetch_lesson(&mut self, lesson_id: &str) -> Result<Arc<Lesson>, ApiError> {
        if let Some(lesson) = self.cache.get(lesson_id) {
            tracing::debug!("Lesson {} served from cache", lesson_id);
            return Ok(Arc::clone(lesson));
        }

        let document = match self.embedded.get(lesson_id) {
            Some(doc) => {
                tracing::debug!("Lesson {} served from embedded data", lesson_id);
                doc.clone()
            }
            None => {
                let Some(source) = &self.source else {
                    return Err(ApiError::not_found(format!("Lesson {}", lesson_id)));
                };
                source
                    .fetch_document(lesson_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found(format!("Lesson {}", lesson_id)))?
            }
        };

        let lesson = Arc::new(normalize(document)?);
        tracing::info!("Loaded lesson {} ({} blocks)", lesson.id, lesson.total_blocks());
        self.cache.insert(lesson_id.to_string(), Arc::clone(&lesson));
        Ok(lesson)
    }
}
