//! Mapping configuration
//!
//! Knobs that stay fixed for the lifetime of a `TypeCoercer`/`Hydrator`.
//! Coercion remains a pure function of (semantic type, raw value) for a
//! given configuration.

use std::env;

use crate::error::{EntityError, EntityResult};

const ENV_ARRAY_DELIMITER: &str = "ELIF_ENTITY_ARRAY_DELIMITER";
const ENV_DATETIME_FORMAT: &str = "ELIF_ENTITY_DATETIME_FORMAT";
const ENV_STRICT_DECIMALS: &str = "ELIF_ENTITY_STRICT_DECIMALS";
const ENV_LENIENT_BATCHES: &str = "ELIF_ENTITY_LENIENT_BATCHES";

/// Configuration for hydration and extraction
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// Separator used by `simple_array` and the `array` split fallback
    pub array_delimiter: char,
    /// chrono format used when extracting temporal values
    pub datetime_format: String,
    /// Reject non-numeric text on decimal/float extraction instead of passing it through
    pub strict_decimals: bool,
    /// Keep hydrating the remaining rows of a batch when one row fails
    pub lenient_batches: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            array_delimiter: ',',
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            strict_decimals: false,
            lenient_batches: true,
        }
    }
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `ELIF_ENTITY_*` environment variables,
    /// falling back to defaults for unset variables
    pub fn from_env() -> EntityResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(ENV_ARRAY_DELIMITER) {
            let mut chars = raw.chars();
            config.array_delimiter = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(invalid_env(ENV_ARRAY_DELIMITER, &raw, "a single character")),
            };
        }

        if let Ok(raw) = env::var(ENV_DATETIME_FORMAT) {
            config.datetime_format = raw;
        }

        if let Ok(raw) = env::var(ENV_STRICT_DECIMALS) {
            config.strict_decimals = parse_flag(ENV_STRICT_DECIMALS, &raw)?;
        }

        if let Ok(raw) = env::var(ENV_LENIENT_BATCHES) {
            config.lenient_batches = parse_flag(ENV_LENIENT_BATCHES, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_array_delimiter(mut self, delimiter: char) -> Self {
        self.array_delimiter = delimiter;
        self
    }

    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    pub fn with_strict_decimals(mut self, strict: bool) -> Self {
        self.strict_decimals = strict;
        self
    }

    pub fn with_lenient_batches(mut self, lenient: bool) -> Self {
        self.lenient_batches = lenient;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> EntityResult<()> {
        if self.datetime_format.trim().is_empty() {
            return Err(EntityError::configuration(
                "MappingConfig",
                "datetime_format cannot be empty",
            ));
        }

        // `[` and `{` mark JSON-encoded arrays
        if matches!(self.array_delimiter, '[' | '{') {
            return Err(EntityError::configuration(
                "MappingConfig",
                format!("'{}' cannot be used as array delimiter", self.array_delimiter),
            ));
        }

        Ok(())
    }
}

fn parse_flag(var: &str, raw: &str) -> EntityResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_env(var, raw, "a boolean")),
    }
}

fn invalid_env(var: &str, raw: &str, expected: &str) -> EntityError {
    EntityError::configuration(
        "MappingConfig",
        format!("{} must be {}, got '{}'", var, expected, raw),
    )
}
