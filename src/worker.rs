//! Worker Execution Adapter
//!
//! Runs one job: resolves the handler for its computation type and turns the
//! handler's result, error, or panic into a [`JobOutcome`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::dispatch::{JobOutcome, JobPayload};
use crate::error::JobError;
use crate::registry::HandlerRegistry;

#[derive(Debug, Clone)]
pub struct Worker {
    registry: Arc<HandlerRegistry>,
}

impl Worker {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, payload: &JobPayload) -> JobOutcome {
        let Some(handler) = self.registry.lookup(&payload.computation_type) else {
            warn!(
                cache_key = %payload.cache_key,
                computation_type = %payload.computation_type,
                "No handler registered"
            );
            return Err(JobError::UnregisteredHandler(
                payload.computation_type.clone(),
            ));
        };

        let started = Instant::now();
        let params = payload.params.clone();
        let run = AssertUnwindSafe(async move { handler(params).await }).catch_unwind();

        match run.await {
            Ok(Ok(value)) => {
                info!(
                    cache_key = %payload.cache_key,
                    computation_type = %payload.computation_type,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Computation finished"
                );
                Ok(value)
            }
            Ok(Err(err)) => {
                warn!(
                    cache_key = %payload.cache_key,
                    computation_type = %payload.computation_type,
                    "Computation failed: {:#}", err
                );
                Err(JobError::Failed(format!("{err:#}")))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    cache_key = %payload.cache_key,
                    computation_type = %payload.computation_type,
                    "Handler panicked: {}", message
                );
                Err(JobError::Panicked(message))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
