//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use talentflow_core::ports::DocumentStore;
use talentflow_core::AssessmentRepository;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub repository: AssessmentRepository,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Arc<Config>) -> Self {
        Self {
            repository: AssessmentRepository::new(store.clone()),
            store,
            config,
        }
    }
}
