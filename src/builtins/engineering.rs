//! Scientific functions
//!
//! Angles are in radians. Domain violations fail the call instead of
//! returning NaN.

use anyhow::{bail, Result};
use serde_json::{Map, Value};

use super::{number, numeric_result, ENGINEERING};
use crate::services::handler_catalog::HandlerCatalog;

/// Largest `n` whose factorial is representable as a finite f64
const MAX_FACTORIAL: f64 = 170.0;

pub fn register(catalog: &mut HandlerCatalog) {
    catalog
        .register_params(ENGINEERING, "sqrt", sqrt)
        .register_params(ENGINEERING, "power", power)
        .register_params(ENGINEERING, "ln", ln)
        .register_params(ENGINEERING, "log10", log10)
        .register_params(ENGINEERING, "sin", sin)
        .register_params(ENGINEERING, "cos", cos)
        .register_params(ENGINEERING, "tan", tan)
        .register_params(ENGINEERING, "factorial", factorial);
}

pub async fn sqrt(params: Map<String, Value>) -> Result<Value> {
    let value = number(&params, "value")?;
    if value < 0.0 {
        bail!("Cannot calculate square root of negative number");
    }
    numeric_result(value.sqrt())
}

pub async fn power(params: Map<String, Value>) -> Result<Value> {
    let base = number(&params, "base")?;
    let exponent = number(&params, "exponent")?;
    numeric_result(base.powf(exponent))
}

fn positive(params: &Map<String, Value>) -> Result<f64> {
    let value = number(params, "value")?;
    if value <= 0.0 {
        bail!("Logarithm undefined for non-positive numbers");
    }
    Ok(value)
}

pub async fn ln(params: Map<String, Value>) -> Result<Value> {
    numeric_result(positive(&params)?.ln())
}

pub async fn log10(params: Map<String, Value>) -> Result<Value> {
    numeric_result(positive(&params)?.log10())
}

pub async fn sin(params: Map<String, Value>) -> Result<Value> {
    numeric_result(number(&params, "angle")?.sin())
}

pub async fn cos(params: Map<String, Value>) -> Result<Value> {
    numeric_result(number(&params, "angle")?.cos())
}

pub async fn tan(params: Map<String, Value>) -> Result<Value> {
    numeric_result(number(&params, "angle")?.tan())
}

pub async fn factorial(params: Map<String, Value>) -> Result<Value> {
    let n = number(&params, "n")?;
    if n < 0.0 || n.fract() != 0.0 {
        bail!("Factorial is only defined for non-negative integers");
    }
    if n > MAX_FACTORIAL {
        bail!("Factorial of {} exceeds the representable range", n);
    }
    let result = (2..=n as u32).fold(1.0_f64, |acc, i| acc * f64::from(i));
    numeric_result(result)
}
