//! Typed key/value fields attached to log records.
//!
//! Keys are plain strings. Values are typed so the record stays structured
//! all the way to the subscriber: strings, integers, durations, errors and
//! nested objects built with [`dict`].

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
}

/// The value half of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Duration(Duration),
    /// Rendered error message (including its source chain).
    Error(String),
    /// Embedded object made of sub-fields.
    Object(Vec<Field>),
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    /// Error field under the conventional `error` key.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::named_error("error", err)
    }

    pub fn named_error(
        key: impl Into<Cow<'static, str>>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        Self::new(key, FieldValue::Error(render_error(err)))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Build one field whose value is an embedded object holding `fields`.
///
/// ```
/// use ctxlog_core::{dict, Field};
///
/// let user = dict("user", [Field::string("name", "ada"), Field::int("id", 7)]);
/// assert_eq!(user.key(), "user");
/// // rendered as {"user": {"name": "ada", "id": 7}}
/// ```
pub fn dict(key: impl Into<Cow<'static, str>>, fields: impl IntoIterator<Item = Field>) -> Field {
    Field::new(key, FieldValue::Object(fields.into_iter().collect()))
}

/// Render an error and its `source()` chain as `outer: inner: root`.
fn render_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let message = inner.to_string();
        // Wrappers often repeat their source in their own message.
        if !rendered.ends_with(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = inner.source();
    }
    rendered
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Error(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{}", n),
            Self::Duration(d) => write!(f, "{:?}", d),
            Self::Object(fields) => match serde_json::to_string(&FieldMap(fields)) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) | Self::Error(s) => serializer.serialize_str(s),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Duration(d) => serializer.collect_str(&format_args!("{:?}", d)),
            Self::Object(fields) => FieldMap(fields).serialize(serializer),
        }
    }
}

/// Serializes a field list as a JSON object, later keys overriding earlier ones.
pub(crate) struct FieldMap<'a>(pub(crate) &'a [Field]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut object = serde_json::Map::new();
        for field in self.0 {
            let value = serde_json::to_value(&field.value).map_err(serde::ser::Error::custom)?;
            object.insert(field.key.to_string(), value);
        }
        let mut map = serializer.serialize_map(Some(object.len()))?;
        for (key, value) in &object {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
