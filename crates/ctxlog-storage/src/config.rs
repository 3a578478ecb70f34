//! Query logger configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Queries slower than this are logged at warn level by default.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(200);

/// Verbosity of the query logger, ordered `Silent < Error < Warn < Info`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Silent,
    Error,
    #[default]
    Warn,
    Info,
}

impl TraceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown trace level: {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for TraceLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Settings for [`SqlLogger`](crate::SqlLogger).
///
/// Deserializes from e.g.
/// `{"slow_threshold_ms": 500, "level": "info", "ignore_record_not_found": true}`;
/// missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Zero disables slow-query detection.
    #[serde(rename = "slow_threshold_ms", with = "threshold_millis")]
    pub slow_threshold: Duration,

    pub level: TraceLevel,

    /// Do not log `QueryReturnedNoRows` as an error.
    pub ignore_record_not_found: bool,

    /// Keep placeholders in logged SQL instead of inlining parameters.
    pub parameterized_queries: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            level: TraceLevel::Warn,
            ignore_record_not_found: false,
            parameterized_queries: false,
        }
    }
}

impl TraceConfig {
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn with_level(mut self, level: TraceLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_ignore_record_not_found(mut self, ignore: bool) -> Self {
        self.ignore_record_not_found = ignore;
        self
    }

    pub fn with_parameterized_queries(mut self, parameterized: bool) -> Self {
        self.parameterized_queries = parameterized;
        self
    }
}

/// Threshold as signed milliseconds. Negative values disable detection.
mod threshold_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Ok(u64::try_from(millis)
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO))
    }
}
