//! Values - Raw rows, typed values, and property slots
//!
//! A `Row` is what a database driver hands over: column names mapped to loosely
//! typed JSON scalars. A `Value` is what the coercion engine produces from one
//! of those scalars once its semantic type is known. `Property<T>` is the slot
//! on an entity struct that receives it, remembering whether it was ever set.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use uuid::Uuid;

use crate::coercion::temporal;
use crate::error::{EntityError, EntityResult, ValueError};

/// A typed value produced by hydration or consumed by extraction
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact decimal, keeps the scale it was written with
    Decimal(Decimal),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
    /// Structured data (objects, arrays) decoded from JSON columns
    Json(JsonValue),
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    /// Map a raw scalar onto the closest variant without interpreting it
    pub fn from_raw(raw: &JsonValue) -> Self {
        match raw {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Text(n.to_string())
                }
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Json(other.clone()),
        }
    }

    /// Raw row representation used when no type-specific rule applies
    pub fn to_raw(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number(Number::from(*i)),
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Decimal(d) => JsonValue::String(d.to_string()),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
            Value::Json(v) => v.clone(),
        }
    }

    fn mismatch(&self, expected: &str) -> ValueError {
        ValueError::new(self, format!("expected {}, found {}", expected, self.type_name()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl From<JsonValue> for Value {
    fn from(raw: JsonValue) -> Self {
        Value::from_raw(&raw)
    }
}

/// A raw row: column name to loosely typed scalar, in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, JsonValue>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style column insertion
    pub fn with_column<T: Into<JsonValue>>(mut self, name: &str, value: T) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Convert any serializable record (a struct, a map) into a row
    pub fn from_record<T: Serialize>(record: &T) -> EntityResult<Self> {
        let json = serde_json::to_value(record).map_err(|e| {
            EntityError::coercion("Row", "<record>", ValueError::new("<record>", e.to_string()))
        })?;
        Row::try_from(json)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column names in row order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl From<Map<String, JsonValue>> for Row {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(map: HashMap<String, JsonValue>) -> Self {
        map.into_iter().collect()
    }
}

impl TryFrom<JsonValue> for Row {
    type Error = EntityError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(EntityError::coercion(
                "Row",
                "<record>",
                ValueError::new(&other, "a row must be a JSON object"),
            )),
        }
    }
}

impl FromIterator<(String, JsonValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Row {
    type Item = (String, JsonValue);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An entity property that may not have been assigned yet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Property<T> {
    Unset,
    Set(T),
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property::Unset
    }
}

impl<T> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Property::Set(value)
    }
}

impl<T> Property<T> {
    pub fn new(value: T) -> Self {
        Property::Set(value)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Property::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Property::Set(value) => Some(value),
            Property::Unset => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Property::Set(value) => Some(value),
            Property::Unset => None,
        }
    }

    /// Read the value, failing with `Uninitialized` if it was never assigned
    pub fn require(&self, name: &str) -> EntityResult<&T> {
        self.get()
            .ok_or_else(|| EntityError::Uninitialized(name.to_string()))
    }

    pub fn set(&mut self, value: T) {
        *self = Property::Set(value);
    }

    pub fn take(&mut self) -> Option<T> {
        match std::mem::take(self) {
            Property::Set(value) => Some(value),
            Property::Unset => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Property::Set(value) => Some(value),
            Property::Unset => None,
        }
    }
}

impl<T: FromValue> Property<T> {
    /// Assign a hydrated value.
    ///
    /// A null value for a non-nullable `T` leaves the slot untouched and
    /// returns `Ok(false)`.
    pub fn assign(&mut self, value: Value) -> Result<bool, ValueError> {
        if value.is_null() && !T::NULLABLE {
            return Ok(false);
        }
        *self = Property::Set(T::from_value(value)?);
        Ok(true)
    }
}

impl<T: ToValue> Property<T> {
    /// The typed value for extraction, `None` when unset
    pub fn read(&self) -> Option<Value> {
        self.get().map(ToValue::to_value)
    }
}

/// Conversion from a hydrated `Value` into a concrete property type
pub trait FromValue: Sized {
    /// Whether the type can hold null
    const NULLABLE: bool = false;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// Conversion from a property type into a `Value` for extraction
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl<T: FromValue> FromValue for Option<T> {
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl FromValue for Value {
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Text(ref s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" | "" => Ok(false),
                _ => Err(value.mismatch("bool")),
            },
            other => Err(other.mismatch("bool")),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_integer_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    let wide: i64 = match value {
                        Value::Int(i) => i,
                        Value::Bool(b) => i64::from(b),
                        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => f as i64,
                        Value::Decimal(d) if d.fract().is_zero() => d
                            .to_i64()
                            .ok_or_else(|| value.mismatch(stringify!($t)))?,
                        Value::Text(ref s) => {
                            return s.trim().parse::<$t>().map_err(|e| ValueError::new(&value, e.to_string()));
                        }
                        other => return Err(other.mismatch(stringify!($t))),
                    };
                    <$t>::try_from(wide).map_err(|_| {
                        ValueError::new(wide, concat!("out of range for ", stringify!($t)))
                    })
                }
            }
        )*
    };
}

impl_integer_value!(i8, i16, i32, i64, u8, u16, u32, isize);

macro_rules! impl_small_integer_to_value {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

impl_small_integer_to_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(ref s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| ValueError::new(&value, e.to_string())),
            Value::Decimal(d) if d.fract().is_zero() => {
                d.to_u64().ok_or_else(|| ValueError::new(d, "out of range for u64"))
            }
            other => {
                let wide = i64::from_value(other)?;
                u64::try_from(wide).map_err(|_| ValueError::new(wide, "out of range for u64"))
            }
        }
    }
}

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        i64::try_from(*self).map_or_else(|_| Value::Decimal(Decimal::from(*self)), Value::Int)
    }
}

impl FromValue for usize {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let wide = u64::from_value(value)?;
        usize::try_from(wide).map_err(|_| ValueError::new(wide, "out of range for usize"))
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        (*self as u64).to_value()
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::Decimal(d) => d.to_f64().ok_or_else(|| value.mismatch("f64")),
            Value::Text(ref s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| ValueError::new(&value, e.to_string())),
            other => Err(other.mismatch("f64")),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        // Through the shortest decimal form so 0.1f32 extracts as "0.1"
        self.to_string()
            .parse::<f64>()
            .map_or(Value::Float(f64::from(*self)), Value::Float)
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Int(i) => Ok(Decimal::from(i)),
            Value::Float(f) => {
                Decimal::from_f64(f).ok_or_else(|| ValueError::new(f, "out of range for decimal"))
            }
            Value::Text(ref s) => parse_decimal(s.trim())
                .ok_or_else(|| ValueError::new(&value, "not a decimal number")),
            other => Err(other.mismatch("decimal")),
        }
    }
}

impl ToValue for Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

/// Parse plain or scientific decimal text without going through floats
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(match value {
            Value::Text(s) => s,
            Value::Json(JsonValue::String(s)) => s,
            Value::Json(other) => other.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
            Value::Null => return Err(Value::Null.mismatch("string")),
            other => other.to_raw().to_string().trim_matches('"').to_string(),
        })
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Text(ref s) => temporal::parse_datetime(s)
                .map(|parsed| parsed.value)
                .ok_or_else(|| ValueError::new(&value, "unrecognized date-time format")),
            Value::Int(secs) => temporal::from_epoch(secs as f64).map(Into::into),
            Value::Float(secs) => temporal::from_epoch(secs).map(Into::into),
            other => Err(other.mismatch("date-time")),
        }
    }
}

impl ToValue for DateTime<FixedOffset> {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        DateTime::<FixedOffset>::from_value(value).map(|ts| ts.with_timezone(&Utc))
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp((*self).into())
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        DateTime::<FixedOffset>::from_value(value).map(|ts| ts.naive_local())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(Utc.from_utc_datetime(self).into())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        DateTime::<FixedOffset>::from_value(value).map(|ts| ts.date_naive())
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        self.and_hms_opt(0, 0, 0)
            .map_or(Value::Null, |midnight| midnight.to_value())
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        DateTime::<FixedOffset>::from_value(value).map(|ts| ts.time())
    }
}

impl ToValue for NaiveTime {
    fn to_value(&self) -> Value {
        Utc::now().date_naive().and_time(*self).to_value()
    }
}

impl FromValue for JsonValue {
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(match value {
            Value::Json(v) => v,
            other => other.to_raw(),
        })
    }
}

impl ToValue for JsonValue {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(ref s) | Value::Json(JsonValue::String(ref s)) => {
                Uuid::parse_str(s.trim()).map_err(|e| ValueError::new(&value, e.to_string()))
            }
            other => Err(other.mismatch("uuid")),
        }
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: DeserializeOwned> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(json) => {
                serde_json::from_value(json.clone()).map_err(|e| ValueError::new(json, e.to_string()))
            }
            Value::Text(ref s) => {
                serde_json::from_str(s).map_err(|e| ValueError::new(&value, e.to_string()))
            }
            other => Err(other.mismatch("sequence")),
        }
    }
}

impl<T: Serialize> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(json) => Value::Json(json),
            Err(e) => {
                tracing::warn!("Failed to serialize sequence property: {}", e);
                Value::Null
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_lifecycle() {
        let mut prop: Property<i64> = Property::default();
        assert!(!prop.is_set());
        assert!(prop.require("id").unwrap_err().is_uninitialized());

        prop.set(7);
        assert_eq!(prop.get(), Some(&7));
        assert_eq!(prop.take(), Some(7));
        assert!(!prop.is_set());
    }

    #[test]
    fn test_assign_null_respects_nullability() {
        let mut required: Property<String> = Property::default();
        assert_eq!(required.assign(Value::Null), Ok(false));
        assert!(!required.is_set());

        let mut optional: Property<Option<String>> = Property::default();
        assert_eq!(optional.assign(Value::Null), Ok(true));
        assert_eq!(optional.get(), Some(&None));
    }

    #[test]
    fn test_integer_conversions() {
        assert_eq!(i32::from_value(Value::Int(42)), Ok(42));
        assert_eq!(u8::from_value(Value::Text(" 12 ".into())), Ok(12));
        assert!(u8::from_value(Value::Int(300)).is_err());
        assert!(i64::from_value(Value::Float(1.5)).is_err());
        assert_eq!(u64::from_value(Value::Text("18446744073709551615".into())), Ok(u64::MAX));
        assert_eq!(u64::MAX.to_value(), Value::Decimal(Decimal::from(u64::MAX)));
    }

    #[test]
    fn test_string_conversion_from_scalars() {
        assert_eq!(String::from_value(Value::Int(5)), Ok("5".to_string()));
        assert_eq!(String::from_value(Value::Json(json!({"a": 1}))), Ok(r#"{"a":1}"#.to_string()));
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn test_temporal_conversions() {
        let ts = DateTime::<Utc>::from_value(Value::Int(1_700_000_000)).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);

        let date = NaiveDate::from_value(Value::Text("2024-03-05".into())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_sequence_conversions() {
        let tags = Vec::<String>::from_value(Value::Json(json!(["a", "b"]))).unwrap();
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tags.to_value(), Value::Json(json!(["a", "b"])));
    }

    #[test]
    fn test_raw_round_trip() {
        assert_eq!(Value::from_raw(&json!(7)), Value::Int(7));
        assert_eq!(Value::from_raw(&json!("x")), Value::Text("x".into()));
        assert_eq!(Value::Decimal(Decimal::new(1050, 2)).to_raw(), json!("10.50"));
    }

    #[test]
    fn test_row_preserves_column_order() {
        let row = Row::new()
            .with_column("z", 1)
            .with_column("a", 2)
            .with_column("m", 3);
        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_row_from_record() {
        #[derive(Serialize)]
        struct Record {
            id: i32,
            name: &'static str,
        }

        let row = Row::from_record(&Record { id: 1, name: "Ada" }).unwrap();
        assert_eq!(row.get("id"), Some(&json!(1)));
        assert_eq!(row.get("name"), Some(&json!("Ada")));
        assert!(Row::try_from(json!([1, 2])).is_err());
    }
}
