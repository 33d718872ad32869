use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Where a parameter value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Path,
    Query,
    Header,
    Matrix,
    Cookie,
    Form,
    Entity,
    Context,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Path => "path",
            Source::Query => "query",
            Source::Header => "header",
            Source::Matrix => "matrix",
            Source::Cookie => "cookie",
            Source::Form => "form",
            Source::Entity => "entity",
            Source::Context => "context",
        };
        f.write_str(name)
    }
}

/// Target type hint used by the value resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Json,
    Bytes,
}

/// A resolved parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Json(Value),
    Bytes(Vec<u8>),
    List(Vec<ParamValue>),
    /// No value was supplied and no default applies.
    Absent,
}

impl ParamValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParamValue::Json(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ParamValue::Bytes(b) => Some(b),
            ParamValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, ParamValue::Absent)
    }
}

/// Raised when a raw value cannot be converted to the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert `{value}` to {ty:?}: {reason}")]
pub struct ConversionError {
    pub value: String,
    pub ty: ParamType,
    pub reason: String,
}

impl ParamType {
    /// Convert a raw string value.
    ///
    /// # Errors
    ///
    /// [`ConversionError`] when the value does not parse as this type.
    pub fn convert(self, raw: &str) -> Result<ParamValue, ConversionError> {
        let fail = |reason: String| ConversionError {
            value: raw.to_string(),
            ty: self,
            reason,
        };
        match self {
            ParamType::String => Ok(ParamValue::String(raw.to_string())),
            ParamType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(ParamValue::Integer)
                .map_err(|e| fail(e.to_string())),
            ParamType::Float => raw
                .trim()
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|e| fail(e.to_string())),
            ParamType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(ParamValue::Boolean(true)),
                "false" | "0" => Ok(ParamValue::Boolean(false)),
                _ => Err(fail("expected true or false".to_string())),
            },
            ParamType::Json => serde_json::from_str(raw)
                .map(ParamValue::Json)
                .map_err(|e| fail(e.to_string())),
            ParamType::Bytes => Ok(ParamValue::Bytes(raw.as_bytes().to_vec())),
        }
    }

    /// Convert a request entity.
    ///
    /// # Errors
    ///
    /// [`ConversionError`] for invalid UTF-8 or JSON, or unparsable scalars.
    pub fn convert_entity(self, body: &[u8]) -> Result<ParamValue, ConversionError> {
        match self {
            ParamType::Bytes => Ok(ParamValue::Bytes(body.to_vec())),
            ParamType::Json => serde_json::from_slice(body)
                .map(ParamValue::Json)
                .map_err(|e| ConversionError {
                    value: String::from_utf8_lossy(body).into_owned(),
                    ty: self,
                    reason: e.to_string(),
                }),
            _ => {
                let text = std::str::from_utf8(body).map_err(|e| ConversionError {
                    value: String::from_utf8_lossy(body).into_owned(),
                    ty: self,
                    reason: e.to_string(),
                })?;
                self.convert(text)
            }
        }
    }
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub source: Source,
    pub name: Arc<str>,
    pub ty: ParamType,
    pub default_value: Option<String>,
    /// Keep the percent-encoded value instead of decoding it.
    pub encoded: bool,
    /// Collect every value into a [`ParamValue::List`].
    pub multi: bool,
}

impl Parameter {
    #[must_use]
    pub fn new(source: Source, name: &str) -> Self {
        Self {
            source,
            name: Arc::from(name),
            ty: ParamType::String,
            default_value: None,
            encoded: false,
            multi: false,
        }
    }

    #[must_use]
    pub fn path(name: &str) -> Self {
        Self::new(Source::Path, name)
    }

    #[must_use]
    pub fn query(name: &str) -> Self {
        Self::new(Source::Query, name)
    }

    #[must_use]
    pub fn header(name: &str) -> Self {
        Self::new(Source::Header, name)
    }

    #[must_use]
    pub fn matrix(name: &str) -> Self {
        Self::new(Source::Matrix, name)
    }

    #[must_use]
    pub fn cookie(name: &str) -> Self {
        Self::new(Source::Cookie, name)
    }

    #[must_use]
    pub fn form(name: &str) -> Self {
        Self::new(Source::Form, name)
    }

    /// The request entity, converted according to `ty`.
    #[must_use]
    pub fn entity(ty: ParamType) -> Self {
        Self::new(Source::Entity, "entity").of_type(ty)
    }

    #[must_use]
    pub fn context(name: &str) -> Self {
        Self::new(Source::Context, name)
    }

    #[must_use]
    pub fn of_type(mut self, ty: ParamType) -> Self {
        self.ty = ty;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    #[must_use]
    pub fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }

    #[must_use]
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.source == Source::Entity
    }
}
