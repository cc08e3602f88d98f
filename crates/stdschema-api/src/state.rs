//! # Application State
//!
//! Shared state for the demo server, passed to handlers via the `State`
//! extractor. Holds the metadata registry, the type-driven validation pipe,
//! the response serializer and the OpenAPI document built at startup.
//!
//! Extractors reach the pipe through `FromRef`, so handlers never name the
//! pipe directly.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::FromRef;
use parking_lot::RwLock;
use stdschema_core::MetadataRegistry;
use stdschema_json::SchemaBuildError;
use utoipa::openapi::OpenApi;

use crate::config::PipeConfig;
use crate::openapi::{document, OpenApiError};
use crate::pipe::{PipeMode, ValidationPipe};
use crate::routes::users::{self, UserRecord};
use crate::serializer::ResponseSerializer;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory store with sequential ids.
///
/// The `parking_lot` lock is never held across `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<BTreeMap<u64, T>>>,
    next_id: Arc<AtomicU64>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Insert the record built for a freshly allocated id.
    pub fn create(&self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = build(id);
        self.data.write().insert(id, record.clone());
        record
    }

    pub fn get(&self, id: u64) -> Option<T> {
        self.data.read().get(&id).cloned()
    }

    /// All records in id order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("schema: {0}")]
    Schema(#[from] SchemaBuildError),
    #[error("openapi: {0}")]
    OpenApi(#[from] OpenApiError),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: MetadataRegistry,
    pub pipe: Arc<ValidationPipe>,
    pub serializer: ResponseSerializer,
    pub openapi: Arc<OpenApi>,
    pub users: Store<UserRecord>,
}

impl AppState {
    /// Register every DTO and response shape, then build the pipe, the
    /// serializer and the OpenAPI document over the populated registry.
    pub fn bootstrap(config: PipeConfig) -> Result<Self, BootstrapError> {
        let registry = MetadataRegistry::new();
        users::register(&registry)?;

        let pipe = ValidationPipe::with_options(
            PipeMode::TypeDriven(registry.clone()),
            config.pipe_options(),
        );
        let openapi = document(&registry, "stdschema demo", env!("CARGO_PKG_VERSION"))?;
        tracing::info!(?registry, options = ?pipe.options(), "application state ready");

        Ok(Self {
            serializer: ResponseSerializer::new(registry.clone()),
            registry,
            pipe: Arc::new(pipe),
            openapi: Arc::new(openapi),
            users: Store::new(),
        })
    }
}

impl FromRef<AppState> for Arc<ValidationPipe> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.pipe)
    }
}

impl FromRef<AppState> for ResponseSerializer {
    fn from_ref(state: &AppState) -> Self {
        state.serializer.clone()
    }
}
