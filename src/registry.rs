//! Handler Registry
//!
//! Maps a computation type to the async function that computes it. Built at
//! startup and shared by `Arc` with the worker; lookups are read-locked and
//! cheap, registration takes the write lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// A registered computation: JSON params in, JSON result out.
pub type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `computation_type`. A later registration for the
    /// same type replaces the earlier one.
    pub fn register<F, Fut>(&self, computation_type: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let computation_type = computation_type.into();
        let handler: Handler = Arc::new(move |params| handler(params).boxed());

        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if handlers.insert(computation_type.clone(), handler).is_some() {
            info!(%computation_type, "Replaced existing handler");
        } else {
            debug!(%computation_type, "Registered handler");
        }
    }

    /// Registers a handler over concrete parameter and result types.
    ///
    /// Params that fail to deserialize into `P` fail the computation.
    pub fn register_typed<P, R, F, Fut>(&self, computation_type: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.register(computation_type, move |params: Value| {
            let handler = handler.clone();
            async move {
                let params: P = serde_json::from_value(params)?;
                let result = handler(params).await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(result)?)
            }
        });
    }

    pub fn lookup(&self, computation_type: &str) -> Option<Handler> {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(computation_type)
            .cloned()
    }

    /// Registered computation types in sorted order.
    pub fn computation_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("computation_types", &self.computation_types())
            .finish()
    }
}
