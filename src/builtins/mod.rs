//! Built-in handler modules
//!
//! Registered under the locators configuration documents use to reference
//! them (`handlers/calculator`, `handlers/engineering`, `handlers/greeting`).

pub mod calculator;
pub mod engineering;
pub mod greeting;

use anyhow::{anyhow, bail, Result};
use serde_json::{json, Map, Value};

use crate::services::handler_catalog::HandlerCatalog;

pub const CALCULATOR: &str = "handlers/calculator";
pub const ENGINEERING: &str = "handlers/engineering";
pub const GREETING: &str = "handlers/greeting";

/// Catalog holding every built-in handler
pub fn catalog() -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new();
    register_all(&mut catalog);
    catalog
}

pub fn register_all(catalog: &mut HandlerCatalog) {
    calculator::register(catalog);
    engineering::register(catalog);
    greeting::register(catalog);
}

/// Reads a required numeric parameter
pub(crate) fn number(params: &Map<String, Value>, field: &str) -> Result<f64> {
    params
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("Parameter '{}' must be a number", field))
}

/// Wraps a computed number as `{"result": n}`
///
/// Whole numbers are emitted as integers so `2 + 3` yields `5`, not `5.0`.
pub(crate) fn numeric_result(value: f64) -> Result<Value> {
    if !value.is_finite() {
        bail!("Result is not a finite number");
    }
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Ok(json!({ "result": value as i64 }))
    } else {
        Ok(json!({ "result": value }))
    }
}
