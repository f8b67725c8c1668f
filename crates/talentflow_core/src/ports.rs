//! crates/talentflow_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core consumes from its collaborators.
//! The document store is the only one: a generic, key-indexed JSON collection store.
//! Any implementation may be slow or fail on any call; the core treats every call
//! as fallible and never retries on its own.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from storage backends.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    Conflict(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Collections
//=========================================================================================

/// The collections kept in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Jobs,
    Candidates,
    Assessments,
    AssessmentResponses,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Candidates => "candidates",
            Collection::Assessments => "assessments",
            Collection::AssessmentResponses => "assessmentResponses",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches one document, or `None` when no document has that id.
    async fn get(&self, collection: Collection, id: &str) -> PortResult<Option<Value>>;

    /// All documents of a collection in insertion order.
    async fn list(&self, collection: Collection) -> PortResult<Vec<Value>>;

    /// Stores a new document. Fails with `Conflict` if the id is taken.
    async fn add(&self, collection: Collection, id: &str, document: Value) -> PortResult<Value>;

    /// Merges the top-level fields of `partial` into an existing document.
    async fn update(&self, collection: Collection, id: &str, partial: Value) -> PortResult<Value>;

    /// Removes a document. Returns whether anything was removed.
    async fn delete(&self, collection: Collection, id: &str) -> PortResult<bool>;

    async fn count(&self, collection: Collection) -> PortResult<usize>;

    /// Stores many documents at once; all or nothing.
    async fn bulk_add(&self, collection: Collection, documents: Vec<(String, Value)>) -> PortResult<()>;
}

/// Shallow merge used by `DocumentStore::update` implementations.
///
/// Top-level keys of `partial` overwrite those of `target`; nested objects are replaced.
pub fn merge_top_level(target: &mut Value, partial: Value) -> PortResult<()> {
    let (Value::Object(target), Value::Object(partial)) = (target, partial) else {
        return Err(PortError::Unexpected(
            "Partial updates require JSON objects".to_string(),
        ));
    };
    for (key, value) in partial {
        target.insert(key, value);
    }
    Ok(())
}
