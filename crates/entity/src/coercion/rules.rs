//! Per-type coercion rules
//!
//! Each function is one half of a `Codec`. Null never reaches these
//! functions; `TypeCoercer` short-circuits it in both directions.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use super::temporal;
use crate::config::MappingConfig;
use crate::error::ValueError;
use crate::value::{parse_decimal, Value};

const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Returns true for text that reads as a finite number (`"12"`, `" -3.5 "`, `"1e3"`)
pub fn is_numeric_text(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.parse::<f64>().map_or(false, f64::is_finite)
}

/// Loose truthiness of a raw scalar
pub fn is_truthy(raw: &JsonValue) -> bool {
    match raw {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        JsonValue::String(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "" | "0" | "0.0" | "false" | "off" | "no" | "n" | "f"
        ),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

fn plain_text(raw: &JsonValue) -> String {
    match raw {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate_float(f: f64, raw: &JsonValue) -> Result<Value, ValueError> {
    if !f.is_finite() || f >= I64_UPPER || f < -I64_UPPER {
        return Err(ValueError::new(raw, "out of range for an integer column"));
    }
    Ok(Value::Int(f.trunc() as i64))
}

// Integer family

pub fn hydrate_integer(raw: &JsonValue, _config: &MappingConfig) -> Result<Value, ValueError> {
    match raw {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if n.is_u64() {
                Err(ValueError::new(raw, "out of range for an integer column"))
            } else {
                truncate_float(n.as_f64().unwrap_or(f64::NAN), raw)
            }
        }
        JsonValue::Bool(b) => Ok(Value::Int(i64::from(*b))),
        JsonValue::String(s) => {
            let text = s.trim();
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::Int(i));
            }
            if let Some(d) = parse_decimal(text) {
                return d
                    .trunc()
                    .to_i64()
                    .map(Value::Int)
                    .ok_or_else(|| ValueError::new(raw, "out of range for an integer column"));
            }
            if is_numeric_text(text) {
                return truncate_float(text.parse::<f64>().unwrap_or(f64::NAN), raw);
            }
            Err(ValueError::new(raw, "not a numeric value"))
        }
        other => Err(ValueError::new(other, "expected a scalar for an integer column")),
    }
}

pub fn extract_integer(value: Value, config: &MappingConfig) -> Result<JsonValue, ValueError> {
    match value {
        Value::Int(i) => Ok(JsonValue::from(i)),
        Value::Bool(b) => Ok(JsonValue::from(i64::from(b))),
        Value::Decimal(d) => d
            .trunc()
            .to_i64()
            .map(JsonValue::from)
            .ok_or_else(|| ValueError::new(d, "out of range for an integer column")),
        other => hydrate_integer(&other.to_raw(), config).map(|v| v.to_raw()),
    }
}

// unsignedBigInt: the integer rules, widened to u64 above i64::MAX

fn above_i64(raw: &JsonValue) -> Option<u64> {
    let wide = match raw {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => parse_decimal(s.trim()).and_then(|d| d.trunc().to_u64()),
        _ => None,
    };
    wide.filter(|w| i64::try_from(*w).is_err())
}

fn unsigned_raw(d: Decimal) -> Result<JsonValue, ValueError> {
    let whole = d.trunc();
    whole
        .to_i64()
        .map(JsonValue::from)
        .or_else(|| whole.to_u64().map(JsonValue::from))
        .ok_or_else(|| ValueError::new(d, "out of range for an unsignedBigInt column"))
}

pub fn hydrate_unsigned_big_int(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    match above_i64(raw) {
        Some(wide) => Ok(Value::Decimal(Decimal::from(wide))),
        None => hydrate_integer(raw, config),
    }
}

pub fn extract_unsigned_big_int(value: Value, config: &MappingConfig) -> Result<JsonValue, ValueError> {
    match value {
        Value::Decimal(d) => unsigned_raw(d),
        Value::Int(_) | Value::Bool(_) => extract_integer(value, config),
        other => match hydrate_unsigned_big_int(&other.to_raw(), config)? {
            Value::Decimal(d) => unsigned_raw(d),
            narrow => extract_integer(narrow, config),
        },
    }
}

// Float, double, decimal

pub fn hydrate_float(raw: &JsonValue, _config: &MappingConfig) -> Result<Value, ValueError> {
    Ok(match raw {
        JsonValue::Number(n) => n.as_f64().map_or_else(|| Value::from_raw(raw), Value::Float),
        JsonValue::String(s) if is_numeric_text(s) => {
            s.trim().parse::<f64>().map_or_else(|_| Value::from_raw(raw), Value::Float)
        }
        other => Value::from_raw(other),
    })
}

pub fn hydrate_decimal(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    let text = match raw {
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) if is_numeric_text(s) => s.trim().to_string(),
        other => return Ok(Value::from_raw(other)),
    };

    match parse_decimal(&text) {
        Some(d) => Ok(Value::Decimal(d)),
        // Outside decimal range: keep the floating value
        None => hydrate_float(&JsonValue::String(text), config),
    }
}

fn float_text(f: f64) -> Result<String, ValueError> {
    if f.is_finite() {
        Ok(f.to_string())
    } else {
        Err(ValueError::new(f, "not a finite number"))
    }
}

pub fn extract_numeric(value: Value, config: &MappingConfig) -> Result<JsonValue, ValueError> {
    let text = match value {
        Value::Decimal(d) => d.to_string(),
        Value::Float(f) => float_text(f)?,
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => i64::from(b).to_string(),
        Value::Text(s) if is_numeric_text(&s) => s,
        other => {
            if config.strict_decimals {
                return Err(ValueError::new(&other, "not a numeric value"));
            }
            tracing::warn!("Passing non-numeric value {} through a numeric column", other);
            return Ok(other.to_raw());
        }
    };
    Ok(JsonValue::String(text))
}

// Boolean

pub fn hydrate_boolean(raw: &JsonValue, _config: &MappingConfig) -> Result<Value, ValueError> {
    Ok(Value::Bool(is_truthy(raw)))
}

pub fn extract_boolean(value: Value, _config: &MappingConfig) -> Result<JsonValue, ValueError> {
    let truthy = match value {
        Value::Bool(b) => b,
        Value::Decimal(d) => !d.is_zero(),
        other => is_truthy(&other.to_raw()),
    };
    Ok(JsonValue::from(i64::from(truthy)))
}

// Temporal

fn parse_instant(raw: &JsonValue, config: &MappingConfig) -> Result<temporal::ParsedDateTime, ValueError> {
    // Text written with the configured format reads back first
    if let JsonValue::String(s) = raw {
        if let Some(parsed) = temporal::parse_with_format(s, &config.datetime_format) {
            return Ok(parsed);
        }
    }

    let epoch = |ts: DateTime<Utc>| temporal::ParsedDateTime {
        value: ts.into(),
        has_offset: true,
    };

    match raw {
        JsonValue::Number(n) => match n.as_i64() {
            Some(secs) => temporal::from_epoch_seconds(secs).map(epoch),
            None => temporal::from_epoch(n.as_f64().unwrap_or(f64::NAN)).map(epoch),
        },
        JsonValue::String(s) if is_numeric_text(s) => {
            let text = s.trim();
            match text.parse::<i64>() {
                Ok(secs) => temporal::from_epoch_seconds(secs).map(epoch),
                Err(_) => temporal::from_epoch(text.parse::<f64>().unwrap_or(f64::NAN)).map(epoch),
            }
        }
        JsonValue::String(s) => temporal::parse_datetime(s)
            .ok_or_else(|| ValueError::new(raw, "unrecognized date-time format")),
        other => Err(ValueError::new(other, "expected a date-time string or epoch seconds")),
    }
}

pub fn hydrate_date(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    let parsed = parse_instant(raw, config)?;
    let midnight = parsed
        .value
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ValueError::new(raw, "invalid calendar date"))?;
    Ok(Value::Timestamp(temporal::as_utc(&midnight)))
}

pub fn hydrate_time(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    if let JsonValue::String(s) = raw {
        if let Some(time) = temporal::parse_time_of_day(s) {
            let today = Utc::now().date_naive().and_time(time);
            return Ok(Value::Timestamp(temporal::as_utc(&today)));
        }
    }
    hydrate_datetime(raw, config)
}

pub fn hydrate_datetime(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    let parsed = parse_instant(raw, config)?;
    Ok(Value::Timestamp(parsed.value.with_timezone(&Utc).into()))
}

pub fn hydrate_datetime_tz(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    Ok(Value::Timestamp(parse_instant(raw, config)?.value))
}

fn instant_of(value: Value, config: &MappingConfig) -> Result<DateTime<FixedOffset>, ValueError> {
    match value {
        Value::Timestamp(ts) => Ok(ts),
        other => parse_instant(&other.to_raw(), config).map(|parsed| parsed.value),
    }
}

/// Offset-free text reads back as UTC, so every temporal type is written in UTC
pub fn extract_utc(value: Value, config: &MappingConfig) -> Result<JsonValue, ValueError> {
    let instant = instant_of(value, config)?.with_timezone(&Utc);
    temporal::format(&instant, &config.datetime_format).map(JsonValue::String)
}

// JSON

pub fn hydrate_json(raw: &JsonValue, _config: &MappingConfig) -> Result<Value, ValueError> {
    match raw {
        JsonValue::String(s) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Null) => Ok(Value::Null),
            Ok(decoded) => Ok(Value::Json(decoded)),
            Err(e) => {
                tracing::debug!("JSON column failed to decode, using null: {}", e);
                Ok(Value::Null)
            }
        },
        other => Ok(Value::Json(other.clone())),
    }
}

pub fn extract_json(value: Value, _config: &MappingConfig) -> Result<JsonValue, ValueError> {
    let encoded = match value {
        Value::Json(json) => json.to_string(),
        Value::Text(s) if serde_json::from_str::<JsonValue>(&s).is_ok() => s,
        Value::Text(s) => JsonValue::String(s).to_string(),
        other => other.to_raw().to_string(),
    };
    Ok(JsonValue::String(encoded))
}

// Arrays

fn split(text: &str, delimiter: char) -> Value {
    if text.is_empty() {
        return Value::Json(JsonValue::Array(Vec::new()));
    }
    Value::Json(JsonValue::Array(
        text.split(delimiter)
            .map(|item| JsonValue::String(item.to_string()))
            .collect(),
    ))
}

pub fn hydrate_array(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    match raw {
        JsonValue::String(s) => {
            let trimmed = s.trim_start();
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                if let Ok(decoded) = serde_json::from_str::<JsonValue>(s) {
                    return Ok(Value::Json(decoded));
                }
            }
            Ok(split(s, config.array_delimiter))
        }
        JsonValue::Array(_) | JsonValue::Object(_) => Ok(Value::Json(raw.clone())),
        other => Ok(split(&plain_text(other), config.array_delimiter)),
    }
}

pub fn hydrate_simple_array(raw: &JsonValue, config: &MappingConfig) -> Result<Value, ValueError> {
    match raw {
        JsonValue::String(s) => Ok(split(s, config.array_delimiter)),
        JsonValue::Array(items) => Ok(Value::Json(JsonValue::Array(
            items
                .iter()
                .map(|item| JsonValue::String(plain_text(item)))
                .collect(),
        ))),
        JsonValue::Object(_) => Err(ValueError::new(raw, "expected a delimited list")),
        other => Ok(split(&plain_text(other), config.array_delimiter)),
    }
}

pub fn extract_simple_array(value: Value, config: &MappingConfig) -> Result<JsonValue, ValueError> {
    match value {
        Value::Json(JsonValue::Array(items)) => {
            let delimiter = config.array_delimiter.to_string();
            let joined = items.iter().map(plain_text).collect::<Vec<_>>().join(&delimiter);
            Ok(JsonValue::String(joined))
        }
        Value::Json(other) => Err(ValueError::new(&other, "expected a list")),
        Value::Text(s) => Ok(JsonValue::String(s)),
        other => Ok(JsonValue::String(plain_text(&other.to_raw()))),
    }
}

// Text family and passthrough

pub fn hydrate_text(raw: &JsonValue, _config: &MappingConfig) -> Result<Value, ValueError> {
    Ok(Value::Text(plain_text(raw)))
}

pub fn hydrate_passthrough(raw: &JsonValue, _config: &MappingConfig) -> Result<Value, ValueError> {
    Ok(Value::from_raw(raw))
}

pub fn extract_passthrough(value: Value, _config: &MappingConfig) -> Result<JsonValue, ValueError> {
    Ok(value.to_raw())
}
