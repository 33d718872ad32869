use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Vendor type used for the machine-readable OPTIONS description.
pub const RESOURCE_DESCRIPTION_TYPE: &str = "application/vnd.jaxrouter.resource+json";

pub static WILDCARD_TYPE: Lazy<MediaType> = Lazy::new(|| MediaType::new("*", "*"));
pub static TEXT_PLAIN_TYPE: Lazy<MediaType> = Lazy::new(|| MediaType::new("text", "plain"));
pub static APPLICATION_JSON_TYPE: Lazy<MediaType> =
    Lazy::new(|| MediaType::new("application", "json"));
pub static APPLICATION_OCTET_STREAM_TYPE: Lazy<MediaType> =
    Lazy::new(|| MediaType::new("application", "octet-stream"));
pub static APPLICATION_FORM_URLENCODED_TYPE: Lazy<MediaType> =
    Lazy::new(|| MediaType::new("application", "x-www-form-urlencoded"));

/// Quality in millis, `1.000`.
pub const MAX_QUALITY: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("malformed media type `{value}`: {reason}")]
    Malformed { value: String, reason: &'static str },
    #[error("invalid quality value `{value}`")]
    InvalidQuality { value: String },
}

/// A parsed media type, `type/subtype;param=value`.
///
/// Type, subtype and parameter names are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    kind: String,
    subtype: String,
    params: Vec<(String, String)>,
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
        })
}

/// Split on `sep` outside double quotes.
pub(crate) fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Parse a quality value into millis.
///
/// Accepts `0`, `0.` up to `0.ddd`, and `1`, `1.` up to `1.000`.
///
/// # Errors
///
/// [`MediaTypeError::InvalidQuality`] for anything else, including values
/// above `1` or with more than three fractional digits.
pub fn parse_quality(raw: &str) -> Result<u16, MediaTypeError> {
    let value = raw.trim();
    let invalid = || MediaTypeError::InvalidQuality {
        value: value.to_string(),
    };
    let (int, frac) = value.split_once('.').unwrap_or((value, ""));
    if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match int {
        "0" => {
            let mut millis = 0u16;
            for (i, b) in frac.bytes().enumerate() {
                millis += u16::from(b - b'0') * [100, 10, 1][i];
            }
            Ok(millis)
        }
        "1" if frac.bytes().all(|b| b == b'0') => Ok(MAX_QUALITY),
        _ => Err(invalid()),
    }
}

impl MediaType {
    #[must_use]
    pub fn new(kind: &str, subtype: &str) -> Self {
        Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params: Vec::new(),
        }
    }

    /// Parse `type/subtype;k=v`. A bare `*` is read as `*/*`.
    ///
    /// # Errors
    ///
    /// [`MediaTypeError::Malformed`] when the type, subtype or a parameter is not
    /// a valid token.
    pub fn parse(value: &str) -> Result<Self, MediaTypeError> {
        let malformed = |reason| MediaTypeError::Malformed {
            value: value.to_string(),
            reason,
        };
        let mut parts = split_unquoted(value, ';').into_iter();
        let essence = parts.next().unwrap_or("").trim();
        let (kind, subtype) = if essence == "*" {
            ("*", "*")
        } else {
            essence
                .split_once('/')
                .ok_or_else(|| malformed("missing `/`"))?
        };
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if !is_token(kind) || !is_token(subtype) {
            return Err(malformed("type and subtype must be tokens"));
        }
        if kind == "*" && subtype != "*" {
            return Err(malformed("wildcard type with concrete subtype"));
        }
        let mut media = Self::new(kind, subtype);
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, raw) = param
                .split_once('=')
                .ok_or_else(|| malformed("parameter without `=`"))?;
            let name = name.trim();
            if !is_token(name) {
                return Err(malformed("parameter name must be a token"));
            }
            let raw = raw.trim();
            let unquoted = raw
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .map(|r| r.replace("\\\"", "\""))
                .unwrap_or_else(|| raw.to_string());
            media
                .params
                .push((name.to_ascii_lowercase(), unquoted));
        }
        Ok(media)
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.params.retain(|(k, _)| *k != name);
        self.params.push((name, value.to_string()));
        self
    }

    #[must_use]
    pub fn is_wildcard_type(&self) -> bool {
        self.kind == "*"
    }

    #[must_use]
    pub fn is_wildcard_subtype(&self) -> bool {
        self.subtype == "*"
    }

    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !self.is_wildcard_type() && !self.is_wildcard_subtype()
    }

    /// 0 for `type/subtype`, 1 for `type/*`, 2 for `*/*`.
    #[must_use]
    pub fn specificity_rank(&self) -> u8 {
        u8::from(self.is_wildcard_type()) + u8::from(self.is_wildcard_subtype())
    }

    /// Wildcard-aware compatibility; parameters are ignored.
    #[must_use]
    pub fn is_compatible(&self, other: &MediaType) -> bool {
        if self.is_wildcard_type() || other.is_wildcard_type() {
            return true;
        }
        self.kind == other.kind
            && (self.is_wildcard_subtype()
                || other.is_wildcard_subtype()
                || self.subtype == other.subtype)
    }

    /// Same `type/subtype`, parameters ignored.
    #[must_use]
    pub fn same_essence(&self, other: &MediaType) -> bool {
        self.kind == other.kind && self.subtype == other.subtype
    }

    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }

    /// Copy without the `q` and `qs` quality parameters.
    #[must_use]
    pub fn without_quality(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            subtype: self.subtype.clone(),
            params: self
                .params
                .iter()
                .filter(|(k, _)| k != "q" && k != "qs")
                .cloned()
                .collect(),
        }
    }

    /// Server-side quality source (`qs`), default `1.000`.
    ///
    /// # Errors
    ///
    /// [`MediaTypeError::InvalidQuality`] when `qs` is present but malformed.
    pub fn quality_source(&self) -> Result<u16, MediaTypeError> {
        self.param("qs").map_or(Ok(MAX_QUALITY), parse_quality)
    }

    /// Pick the more specific of two compatible types.
    #[must_use]
    pub fn most_specific<'a>(a: &'a MediaType, b: &'a MediaType) -> &'a MediaType {
        if a.is_wildcard_type() && !b.is_wildcard_type() {
            return b;
        }
        if a.is_wildcard_subtype() && !b.is_wildcard_subtype() {
            return b;
        }
        if b.params.len() > a.params.len() && a.specificity_rank() == b.specificity_rank() {
            return b;
        }
        a
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (k, v) in &self.params {
            if is_token(v) {
                write!(f, ";{k}={v}")?;
            } else {
                write!(f, ";{k}=\"{}\"", v.replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
