//! services/api/src/adapters/simulated.rs
//!
//! A `DocumentStore` decorator that behaves like a remote backend: every call
//! waits a random delay and may fail with a server error. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use talentflow_core::ports::{Collection, DocumentStore, PortError, PortResult};
use tracing::warn;

use crate::config::SimulationConfig;

pub struct SimulatedBackend<S> {
    inner: S,
    settings: SimulationConfig,
}

impl<S: DocumentStore> SimulatedBackend<S> {
    pub fn new(inner: S, settings: SimulationConfig) -> Self {
        Self { inner, settings }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Sleeps for the simulated latency, then decides whether the call fails.
    async fn simulate(&self, operation: &str, collection: Collection) -> PortResult<()> {
        let (delay_ms, fail) = {
            let mut rng = rand::rng();
            let delay = if self.settings.latency_max_ms > self.settings.latency_min_ms {
                rng.random_range(self.settings.latency_min_ms..=self.settings.latency_max_ms)
            } else {
                self.settings.latency_min_ms
            };
            (delay, rng.random_bool(self.settings.error_rate.clamp(0.0, 1.0)))
        };

        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if fail {
            warn!(operation, %collection, "Simulated server error");
            return Err(PortError::Unexpected("Server error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for SimulatedBackend<S> {
    async fn get(&self, collection: Collection, id: &str) -> PortResult<Option<Value>> {
        self.simulate("get", collection).await?;
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: Collection) -> PortResult<Vec<Value>> {
        self.simulate("list", collection).await?;
        self.inner.list(collection).await
    }

    async fn add(&self, collection: Collection, id: &str, document: Value) -> PortResult<Value> {
        self.simulate("add", collection).await?;
        self.inner.add(collection, id, document).await
    }

    async fn update(&self, collection: Collection, id: &str, partial: Value) -> PortResult<Value> {
        self.simulate("update", collection).await?;
        self.inner.update(collection, id, partial).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> PortResult<bool> {
        self.simulate("delete", collection).await?;
        self.inner.delete(collection, id).await
    }

    async fn count(&self, collection: Collection) -> PortResult<usize> {
        self.simulate("count", collection).await?;
        self.inner.count(collection).await
    }

    async fn bulk_add(&self, collection: Collection, documents: Vec<(String, Value)>) -> PortResult<()> {
        self.simulate("bulk_add", collection).await?;
        self.inner.bulk_add(collection, documents).await
    }
}
