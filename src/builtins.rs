//! Builtin computations registered by the server binary.
//!
//! Small on purpose: they exist so every coordinator path (success, slow
//! job, failure) can be driven over HTTP without writing a handler first.

use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::HandlerRegistry;

#[derive(Debug, Deserialize)]
struct SumParams {
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct DelayParams {
    ms: u64,
    #[serde(default)]
    value: Value,
}

/// Registers `echo`, `sum`, `delay` and `fail`.
pub fn register_builtins(registry: &HandlerRegistry) {
    registry.register("echo", |params| async move { Ok(params) });

    registry.register("sum", |params| async move {
        let params: SumParams =
            serde_json::from_value(params).context("sum expects {\"values\": [numbers]}")?;
        let sum: f64 = params.values.iter().sum();
        Ok(json!({ "sum": sum }))
    });

    registry.register("delay", |params| async move {
        let params: DelayParams =
            serde_json::from_value(params).context("delay expects {\"ms\": n, \"value\": v}")?;
        tokio::time::sleep(Duration::from_millis(params.ms)).await;
        Ok(params.value)
    });

    registry.register("fail", |params: Value| async move {
        let reason = params["reason"].as_str().unwrap_or("requested failure");
        bail!("{}", reason)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HandlerRegistry {
        let registry = HandlerRegistry::new();
        register_builtins(&registry);
        registry
    }

    #[test]
    fn test_builtins_registered() {
        assert_eq!(
            registry().computation_types(),
            vec!["delay", "echo", "fail", "sum"]
        );
    }

    #[tokio::test]
    async fn test_sum() {
        let handler = registry().lookup("sum").unwrap();
        let result = handler(json!({"values": [1, 2, 3.5]})).await.unwrap();
        assert_eq!(result, json!({"sum": 6.5}));

        let err = handler(json!({"values": "nope"})).await.unwrap_err();
        assert!(err.to_string().contains("sum expects"));
    }

    #[tokio::test]
    async fn test_delay_returns_value() {
        let handler = registry().lookup("delay").unwrap();
        let result = handler(json!({"ms": 5, "value": {"ok": true}})).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_fail() {
        let handler = registry().lookup("fail").unwrap();
        let err = handler(json!({"reason": "nope"})).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
