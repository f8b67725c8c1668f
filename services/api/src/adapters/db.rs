//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. Every collection lives in one
//! SQLite table keyed by `(collection, id)`, with the document kept as JSON text.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use talentflow_core::ports::{
    merge_top_level, Collection, DocumentStore, PortError, PortResult,
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`.
    ///
    /// An in-memory database exists per connection, so it gets a single one.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    body: String,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a primary key violation on insert to `Conflict`.
fn insert_error(e: sqlx::Error, id: &str) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => PortError::Conflict(id.to_string()),
        _ => unexpected(e),
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn get(&self, collection: Collection, id: &str) -> PortResult<Option<Value>> {
        sqlx::query_as::<_, DocumentRecord>(
            "SELECT body FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(DocumentRecord::to_domain)
        .transpose()
    }

    async fn list(&self, collection: Collection) -> PortResult<Vec<Value>> {
        sqlx::query_as::<_, DocumentRecord>(
            "SELECT body FROM documents WHERE collection = ? ORDER BY position",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?
        .into_iter()
        .map(DocumentRecord::to_domain)
        .collect()
    }

    async fn add(&self, collection: Collection, id: &str, document: Value) -> PortResult<Value> {
        let body = serde_json::to_string(&document)?;
        sqlx::query(
            "INSERT INTO documents (collection, id, body, position) \
             VALUES (?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM documents WHERE collection = ?))",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(body)
        .bind(collection.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, id))?;
        debug!(%collection, id, "Document added");
        Ok(document)
    }

    async fn update(&self, collection: Collection, id: &str, partial: Value) -> PortResult<Value> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT body FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("{} {}", collection, id)))?;

        let mut document = record.to_domain()?;
        merge_top_level(&mut document, partial)?;
        sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
            .bind(serde_json::to_string(&document)?)
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(document)
    }

    async fn delete(&self, collection: Collection, id: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: Collection) -> PortResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count as usize)
    }

    async fn bulk_add(&self, collection: Collection, documents: Vec<(String, Value)>) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        for (id, document) in documents {
            sqlx::query(
                "INSERT INTO documents (collection, id, body, position) \
                 VALUES (?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM documents WHERE collection = ?))",
            )
            .bind(collection.as_str())
            .bind(&id)
            .bind(serde_json::to_string(&document)?)
            .bind(collection.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| insert_error(e, &id))?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn adapter() -> DbAdapter {
        let db = DbAdapter::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn add_get_and_list_keep_insertion_order() {
        let db = adapter().await;
        db.add(Collection::Jobs, "b", json!({"id": "b"})).await.unwrap();
        db.add(Collection::Jobs, "a", json!({"id": "a"})).await.unwrap();

        assert_eq!(db.get(Collection::Jobs, "a").await.unwrap(), Some(json!({"id": "a"})));
        assert_eq!(db.get(Collection::Candidates, "a").await.unwrap(), None);
        let ids: Vec<Value> = db
            .list(Collection::Jobs)
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("b"), json!("a")]);
        assert_eq!(db.count(Collection::Jobs).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_ids_conflict() {
        let db = adapter().await;
        db.add(Collection::Jobs, "a", json!({})).await.unwrap();
        let err = db.add(Collection::Jobs, "a", json!({})).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let db = adapter().await;
        db.add(Collection::Assessments, "x", json!({"title": "T", "isPublished": false}))
            .await
            .unwrap();
        let merged = db
            .update(Collection::Assessments, "x", json!({"isPublished": true}))
            .await
            .unwrap();
        assert_eq!(merged, json!({"title": "T", "isPublished": true}));

        let err = db.update(Collection::Assessments, "missing", json!({})).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_and_bulk_add() {
        let db = adapter().await;
        db.bulk_add(
            Collection::Candidates,
            vec![("c1".into(), json!({"id": "c1"})), ("c2".into(), json!({"id": "c2"}))],
        )
        .await
        .unwrap();
        assert!(db.delete(Collection::Candidates, "c1").await.unwrap());
        assert!(!db.delete(Collection::Candidates, "c1").await.unwrap());
        assert_eq!(db.count(Collection::Candidates).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn full_assessment_survives_a_save_and_reload() {
        use std::sync::Arc;
        use talentflow_core::builder::{add_option, add_question, add_section, update_question};
        use talentflow_core::{
            AssessmentRepository, ConditionalLogic, QuestionPatch, QuestionType, ValidationRules,
        };

        let repo = AssessmentRepository::new(Arc::new(adapter().await));
        let mut doc = repo.create_assessment("job-1", "Platform", "Two sections").await.unwrap();
        doc = add_section(&add_section(&doc).unwrap()).unwrap();
        let (s1, s2) = (doc.sections[0].id.clone(), doc.sections[1].id.clone());
        for section_id in [&s1, &s1, &s2, &s2, &s2] {
            doc = add_question(&doc, section_id).unwrap();
        }
        let id_of = |doc: &talentflow_core::Assessment, section: usize, question: usize| {
            doc.sections[section].questions[question].id.clone()
        };
        let trigger = id_of(&doc, 0, 0);
        doc = add_option(&doc, &s1, &trigger).unwrap();

        let patches = [
            (s1.clone(), id_of(&doc, 0, 1), QuestionPatch {
                kind: Some(QuestionType::MultiChoice),
                ..Default::default()
            }),
            (s2.clone(), id_of(&doc, 1, 0), QuestionPatch {
                kind: Some(QuestionType::LongText),
                required: Some(true),
                options: Some(None),
                validation: Some(Some(ValidationRules {
                    min_length: Some(10),
                    max_length: Some(500),
                    ..Default::default()
                })),
                conditional_logic: Some(Some(ConditionalLogic {
                    depends_on: trigger.clone(),
                    show_when: "Option 3".into(),
                })),
                ..Default::default()
            }),
            (s2.clone(), id_of(&doc, 1, 1), QuestionPatch {
                kind: Some(QuestionType::Numeric),
                options: Some(None),
                validation: Some(Some(ValidationRules {
                    min: Some(0.5),
                    max: Some(20.0),
                    ..Default::default()
                })),
                ..Default::default()
            }),
            (s2.clone(), id_of(&doc, 1, 2), QuestionPatch {
                kind: Some(QuestionType::FileUpload),
                question: Some("Upload your résumé".into()),
                options: Some(None),
                ..Default::default()
            }),
        ];
        for (section_id, question_id, patch) in patches {
            doc = update_question(&doc, &section_id, &question_id, patch).unwrap();
        }

        let saved = repo.save_assessment(&doc).await.unwrap();
        let loaded = repo.get_assessment(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.sections, doc.sections);
        assert_eq!(loaded.question_count(), 5);
    }
}
