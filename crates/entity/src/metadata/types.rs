//! Semantic Types - The closed set of column types a field can declare

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column type tag declared with `#[field(type = "...")]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    String,
    Char,
    Text,
    MediumText,
    LongText,
    Integer,
    TinyInt,
    SmallInt,
    BigInt,
    UnsignedBigInt,
    Year,
    Decimal,
    Float,
    Double,
    Boolean,
    Date,
    Time,
    DateTime,
    DateTimeTz,
    Timestamp,
    TimestampTz,
    Uuid,
    Binary,
    Json,
    SimpleJson,
    Array,
    SimpleArray,
    Enum,
    Set,
    Geometry,
    Point,
    LineString,
    Polygon,
    IpAddress,
    MacAddress,
}

/// An attribute tag that names no semantic type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownSemanticType(pub String);

impl SemanticType {
    pub const ALL: [SemanticType; 35] = [
        SemanticType::String,
        SemanticType::Char,
        SemanticType::Text,
        SemanticType::MediumText,
        SemanticType::LongText,
        SemanticType::Integer,
        SemanticType::TinyInt,
        SemanticType::SmallInt,
        SemanticType::BigInt,
        SemanticType::UnsignedBigInt,
        SemanticType::Year,
        SemanticType::Decimal,
        SemanticType::Float,
        SemanticType::Double,
        SemanticType::Boolean,
        SemanticType::Date,
        SemanticType::Time,
        SemanticType::DateTime,
        SemanticType::DateTimeTz,
        SemanticType::Timestamp,
        SemanticType::TimestampTz,
        SemanticType::Uuid,
        SemanticType::Binary,
        SemanticType::Json,
        SemanticType::SimpleJson,
        SemanticType::Array,
        SemanticType::SimpleArray,
        SemanticType::Enum,
        SemanticType::Set,
        SemanticType::Geometry,
        SemanticType::Point,
        SemanticType::LineString,
        SemanticType::Polygon,
        SemanticType::IpAddress,
        SemanticType::MacAddress,
    ];

    /// Canonical attribute tag
    pub fn tag(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Char => "char",
            Self::Text => "text",
            Self::MediumText => "mediumText",
            Self::LongText => "longText",
            Self::Integer => "integer",
            Self::TinyInt => "tinyInt",
            Self::SmallInt => "smallInt",
            Self::BigInt => "bigInt",
            Self::UnsignedBigInt => "unsignedBigInt",
            Self::Year => "year",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::DateTimeTz => "datetimetz",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamptz",
            Self::Uuid => "uuid",
            Self::Binary => "binary",
            Self::Json => "json",
            Self::SimpleJson => "simple_json",
            Self::Array => "array",
            Self::SimpleArray => "simple_array",
            Self::Enum => "enum",
            Self::Set => "set",
            Self::Geometry => "geometry",
            Self::Point => "point",
            Self::LineString => "linestring",
            Self::Polygon => "polygon",
            Self::IpAddress => "ipAddress",
            Self::MacAddress => "macAddress",
        }
    }

    /// Returns true for the integer family (including `year`)
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::TinyInt
                | Self::SmallInt
                | Self::BigInt
                | Self::UnsignedBigInt
                | Self::Year
        )
    }

    /// Returns true for float, double and decimal
    pub fn is_fractional(self) -> bool {
        matches!(self, Self::Decimal | Self::Float | Self::Double)
    }

    /// Returns true for the date/time family
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date
                | Self::Time
                | Self::DateTime
                | Self::DateTimeTz
                | Self::Timestamp
                | Self::TimestampTz
        )
    }

    /// Returns true for types whose temporal values keep their own offset
    pub fn keeps_timezone(self) -> bool {
        matches!(self, Self::DateTimeTz | Self::TimestampTz)
    }

    /// Returns true for types that are stored as text
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Self::String | Self::Char | Self::Text | Self::MediumText | Self::LongText
        )
    }

    /// Column length used when the field declares none
    pub fn default_length(self) -> Option<u32> {
        match self {
            Self::String | Self::Char => Some(255),
            Self::Uuid => Some(36),
            Self::IpAddress => Some(45),
            Self::MacAddress => Some(17),
            _ => None,
        }
    }

    /// Infer a semantic type from a declared Rust type such as
    /// `chrono::DateTime<Utc>` or `i64`. Matching is case-insensitive on the
    /// last path segment; returns `None` for types with no natural mapping.
    pub fn infer(declared: &str) -> Option<Self> {
        let normalized: String = declared
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let (head, args) = match normalized.find('<') {
            Some(open) => (
                &normalized[..open],
                normalized[open + 1..].trim_end_matches('>'),
            ),
            None => (normalized.as_str(), ""),
        };
        let base = head.rsplit("::").next().unwrap_or(head);

        let inferred = match base {
            "datetime" if args.contains("fixedoffset") || args.contains("tz") => Self::DateTimeTz,
            "datetime" | "naivedatetime" | "datetimeimmutable" => Self::DateTime,
            "naivedate" | "date" => Self::Date,
            "naivetime" | "time" => Self::Time,
            "i8" | "u8" => Self::TinyInt,
            "i16" | "u16" => Self::SmallInt,
            "i32" | "u32" | "isize" | "int" | "integer" => Self::Integer,
            "i64" => Self::BigInt,
            "u64" | "usize" => Self::UnsignedBigInt,
            "f32" | "float" => Self::Float,
            "f64" | "double" => Self::Double,
            "decimal" => Self::Decimal,
            "bool" | "boolean" => Self::Boolean,
            "char" => Self::Char,
            "string" | "str" => Self::String,
            "jsonvalue" => Self::Json,
            "value" if head.contains("serde_json") => Self::Json,
            "vec" if args == "u8" => Self::Binary,
            "vec" | "array" => Self::Array,
            "uuid" => Self::Uuid,
            "ipaddr" | "ipv4addr" | "ipv6addr" => Self::IpAddress,
            _ => return None,
        };
        Some(inferred)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SemanticType {
    type Err = UnknownSemanticType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.trim().to_lowercase().as_str() {
            "string" => Self::String,
            "char" => Self::Char,
            "text" => Self::Text,
            "mediumtext" => Self::MediumText,
            "longtext" => Self::LongText,
            "integer" | "int" => Self::Integer,
            "tinyint" => Self::TinyInt,
            "smallint" => Self::SmallInt,
            "bigint" => Self::BigInt,
            "unsignedbigint" => Self::UnsignedBigInt,
            "year" => Self::Year,
            "decimal" => Self::Decimal,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" | "bool" => Self::Boolean,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::DateTime,
            "datetimetz" => Self::DateTimeTz,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::TimestampTz,
            "uuid" => Self::Uuid,
            "binary" | "blob" => Self::Binary,
            "json" => Self::Json,
            "simple_json" => Self::SimpleJson,
            "array" => Self::Array,
            "simple_array" => Self::SimpleArray,
            "enum" => Self::Enum,
            "set" => Self::Set,
            "geometry" => Self::Geometry,
            "point" => Self::Point,
            "linestring" => Self::LineString,
            "polygon" => Self::Polygon,
            "ipaddress" => Self::IpAddress,
            "macaddress" => Self::MacAddress,
            _ => return Err(UnknownSemanticType(s.to_string())),
        };
        Ok(parsed)
    }
}
