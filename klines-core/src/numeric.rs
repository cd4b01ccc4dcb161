//! Normalization of loosely typed JSON payload fields.
//!
//! Exchanges send prices as JSON numbers or numeric strings. Both normalize to
//! [`Decimal`]; anything else is a decode failure.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::KlinesError;

/// Decimal value of a price or volume field.
///
/// `null` and the empty string are treated as zero. Scientific notation is accepted.
///
/// # Errors
/// Returns `KlinesError::Data` for booleans, arrays, objects and non-numeric strings.
pub fn decimal_from_json(value: &Value, field: &str) -> Result<Decimal, KlinesError> {
    match value {
        Value::Null => Ok(Decimal::ZERO),
        Value::Number(n) => parse_decimal(&n.to_string(), field),
        Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Value::String(s) => parse_decimal(s.trim(), field),
        other => Err(KlinesError::Data(format!(
            "{field}: expected a number, got {other}"
        ))),
    }
}

/// Decimal value at `idx` of a positional row; a missing column counts as `null`.
///
/// # Errors
/// See [`decimal_from_json`].
pub fn decimal_at(row: &[Value], idx: usize, field: &str) -> Result<Decimal, KlinesError> {
    decimal_from_json(row.get(idx).unwrap_or(&Value::Null), field)
}

/// Integral timestamp of a record.
///
/// Unlike prices a timestamp has no sensible default, so `null` is rejected.
///
/// # Errors
/// Returns `KlinesError::Data` when the value is absent, fractional or not numeric.
pub fn timestamp_from_json(value: &Value, field: &str) -> Result<i64, KlinesError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        KlinesError::Data(format!("{field}: expected an integral timestamp, got {value}"))
    })
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, KlinesError> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| KlinesError::Data(format!("{field}: '{s}' is not numeric")))
}
