//! Basic arithmetic on two numbers `a` and `b`

use anyhow::{bail, Result};
use serde_json::{Map, Value};

use super::{number, numeric_result, CALCULATOR};
use crate::services::handler_catalog::HandlerCatalog;

pub fn register(catalog: &mut HandlerCatalog) {
    catalog
        .register_params(CALCULATOR, "add", add)
        .register_params(CALCULATOR, "subtract", subtract)
        .register_params(CALCULATOR, "multiply", multiply)
        .register_params(CALCULATOR, "divide", divide);
}

fn operands(params: &Map<String, Value>) -> Result<(f64, f64)> {
    Ok((number(params, "a")?, number(params, "b")?))
}

pub async fn add(params: Map<String, Value>) -> Result<Value> {
    let (a, b) = operands(&params)?;
    numeric_result(a + b)
}

pub async fn subtract(params: Map<String, Value>) -> Result<Value> {
    let (a, b) = operands(&params)?;
    numeric_result(a - b)
}

pub async fn multiply(params: Map<String, Value>) -> Result<Value> {
    let (a, b) = operands(&params)?;
    numeric_result(a * b)
}

pub async fn divide(params: Map<String, Value>) -> Result<Value> {
    let (a, b) = operands(&params)?;
    if b == 0.0 {
        bail!("Division by zero is not allowed");
    }
    numeric_result(a / b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add() {
        let result = add(params(json!({"a": 2, "b": 3}))).await.unwrap();
        assert_eq!(result, json!({"result": 5}));
    }

    #[tokio::test]
    async fn test_divide_fractional() {
        let result = divide(params(json!({"a": 1, "b": 4}))).await.unwrap();
        assert_eq!(result, json!({"result": 0.25}));
    }

    #[tokio::test]
    async fn test_divide_by_zero_fails() {
        let err = divide(params(json!({"a": 1, "b": 0}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Division by zero is not allowed");
    }

    #[tokio::test]
    async fn test_non_numeric_operand_fails() {
        assert!(subtract(params(json!({"a": "x", "b": 1}))).await.is_err());
    }
}
