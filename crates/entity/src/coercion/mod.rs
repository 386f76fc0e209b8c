//! Type coercion engine
//!
//! Every `SemanticType` maps to a `Codec`, a pair of pure functions converting
//! a raw row scalar into a typed `Value` (hydrate) and back (extract). The
//! mapping is an exhaustive match, so a new semantic type cannot be added
//! without choosing its rules.

pub mod rules;
pub mod temporal;

use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;

use crate::config::MappingConfig;
use crate::error::ValueError;
use crate::metadata::SemanticType;
use crate::value::Value;

/// Raw scalar -> typed value
pub type HydrateFn = fn(&JsonValue, &MappingConfig) -> Result<Value, ValueError>;

/// Typed value -> raw scalar
pub type ExtractFn = fn(Value, &MappingConfig) -> Result<JsonValue, ValueError>;

/// The conversion pair for one semantic type
#[derive(Clone, Copy)]
pub struct Codec {
    pub hydrate: HydrateFn,
    pub extract: ExtractFn,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl SemanticType {
    /// The conversion rules for this type
    pub fn codec(self) -> Codec {
        use rules::*;

        let (hydrate, extract): (HydrateFn, ExtractFn) = match self {
            Self::Integer
            | Self::TinyInt
            | Self::SmallInt
            | Self::BigInt
            | Self::Year => (hydrate_integer, extract_integer),
            Self::UnsignedBigInt => (hydrate_unsigned_big_int, extract_unsigned_big_int),
            Self::Float | Self::Double => (hydrate_float, extract_numeric),
            Self::Decimal => (hydrate_decimal, extract_numeric),
            Self::Boolean => (hydrate_boolean, extract_boolean),
            Self::Date => (hydrate_date, extract_utc),
            Self::Time => (hydrate_time, extract_utc),
            Self::DateTime | Self::Timestamp => (hydrate_datetime, extract_utc),
            Self::DateTimeTz | Self::TimestampTz => (hydrate_datetime_tz, extract_utc),
            Self::Json | Self::SimpleJson => (hydrate_json, extract_json),
            Self::Array => (hydrate_array, extract_json),
            Self::SimpleArray => (hydrate_simple_array, extract_simple_array),
            Self::String | Self::Char | Self::Text | Self::MediumText | Self::LongText => {
                (hydrate_text, extract_passthrough)
            }
            Self::Uuid
            | Self::Binary
            | Self::Enum
            | Self::Set
            | Self::Geometry
            | Self::Point
            | Self::LineString
            | Self::Polygon
            | Self::IpAddress
            | Self::MacAddress => (hydrate_passthrough, extract_passthrough),
        };

        Codec { hydrate, extract }
    }
}

/// Applies codecs under a fixed `MappingConfig`
#[derive(Debug, Clone, Default)]
pub struct TypeCoercer {
    config: MappingConfig,
}

impl TypeCoercer {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Convert a raw scalar. Null is never coerced; with no semantic type the
    /// raw value is mapped onto the closest `Value` unchanged.
    pub fn hydrate(&self, ty: Option<SemanticType>, raw: &JsonValue) -> Result<Value, ValueError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match ty {
            Some(ty) => (ty.codec().hydrate)(raw, &self.config),
            None => Ok(Value::from_raw(raw)),
        }
    }

    /// Convert a typed value back to a raw scalar. Null always extracts as null.
    pub fn extract(&self, ty: Option<SemanticType>, value: Value) -> Result<JsonValue, ValueError> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        match ty {
            Some(ty) => (ty.codec().extract)(value, &self.config),
            None => Ok(value.to_raw()),
        }
    }
}

static DEFAULT_COERCER: Lazy<TypeCoercer> = Lazy::new(TypeCoercer::default);

/// Hydrate one raw value under the default configuration
pub fn hydrate_value(ty: SemanticType, raw: &JsonValue) -> Result<Value, ValueError> {
    DEFAULT_COERCER.hydrate(Some(ty), raw)
}

/// Extract one typed value under the default configuration
pub fn extract_value(ty: SemanticType, value: Value) -> Result<JsonValue, ValueError> {
    DEFAULT_COERCER.extract(Some(ty), value)
}
