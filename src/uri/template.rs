//! URI template compilation.
//!
//! A template such as `users/{id}/posts/{slug: [a-z0-9-]+}` is compiled into an
//! anchored regular expression plus the ordered list of parameter names and the
//! capture group each one binds. Every compiled regex ends with a final
//! `(/.*)?` group that captures the unmatched remainder of the path, so a
//! template can consume a prefix and hand the rest to child resources.

use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Regex used for `{name}` placeholders without an explicit regex.
pub const DEFAULT_VARIABLE_REGEX: &str = "[^/]+?";

/// Errors raised while compiling a URI template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unbalanced braces in template `{template}`")]
    UnbalancedBraces { template: String },
    #[error("empty parameter name in template `{template}`")]
    EmptyName { template: String },
    #[error("invalid parameter name `{name}` in template `{template}`")]
    InvalidName { template: String, name: String },
    #[error("invalid regex `{regex}` for parameter `{name}`: {reason}")]
    InvalidRegex {
        name: String,
        regex: String,
        reason: String,
    },
    #[error("parameter `{name}` is declared with different regexes `{first}` and `{second}`")]
    InconsistentRegex {
        name: String,
        first: String,
        second: String,
    },
}

/// A compiled URI template.
#[derive(Clone)]
pub struct UriTemplate {
    template: String,
    pattern: String,
    regex: Regex,
    bindings: Vec<(Arc<str>, usize)>,
    remainder_group: usize,
    literal_chars: usize,
    explicit_regexes: usize,
}

/// Result of matching a path against a template.
#[derive(Debug)]
pub struct UriMatch<'p> {
    /// Prefix of the path consumed by the template.
    pub consumed: &'p str,
    /// Unmatched remainder, empty or starting with `/`.
    pub remainder: &'p str,
    groups: Vec<Option<&'p str>>,
}

impl<'p> UriMatch<'p> {
    /// Value of the capture group at `index`; missing optional groups are `None`.
    #[must_use]
    pub fn group(&self, index: usize) -> Option<&'p str> {
        self.groups.get(index).copied().flatten()
    }
}

/// Normalize a template: ensure a single leading `/` and drop trailing ones.
///
/// `""` and `"/"` both normalize to the empty template.
#[must_use]
pub fn normalize(template: &str) -> String {
    let trimmed = template.trim().trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Characters a literal may carry unencoded in a request path.
fn path_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '.' | '_' | '~' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';'
                | '=' | ':' | '@' | '/'
        )
}

fn push_escape_hex(byte: u8, out: &mut String) {
    out.push('%');
    for h in format!("{byte:02X}").chars() {
        if h.is_ascii_alphabetic() {
            out.push('[');
            out.push(h.to_ascii_lowercase());
            out.push(h);
            out.push(']');
        } else {
            out.push(h);
        }
    }
}

/// Escape a literal run. Characters outside the path-safe set are
/// percent-encoded first; `%XY` escapes match case-insensitively.
fn escape_literal(literal: &str, out: &mut String) {
    let chars: Vec<char> = literal.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '%'
            && i + 2 < chars.len()
            && chars[i + 1].is_ascii_hexdigit()
            && chars[i + 2].is_ascii_hexdigit()
        {
            out.push('%');
            for h in &chars[i + 1..i + 3] {
                if h.is_ascii_alphabetic() {
                    out.push('[');
                    out.push(h.to_ascii_lowercase());
                    out.push(h.to_ascii_uppercase());
                    out.push(']');
                } else {
                    out.push(*h);
                }
            }
            i += 3;
            continue;
        }
        let mut buf = [0u8; 4];
        let encoded = c.encode_utf8(&mut buf);
        if path_safe(c) {
            out.push_str(&regex::escape(encoded));
        } else {
            for byte in encoded.bytes() {
                push_escape_hex(byte, out);
            }
        }
        i += 1;
    }
}

impl UriTemplate {
    /// Compile a template string.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] for unbalanced braces, bad parameter names,
    /// invalid embedded regexes or a name repeated with a different regex.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let normalized = normalize(template);
        let chars: Vec<char> = normalized.chars().collect();

        let mut pattern = String::with_capacity(normalized.len() * 2);
        let mut literal = String::new();
        let mut literal_chars = 0usize;
        let mut explicit_regexes = 0usize;
        let mut group = 0usize;
        let mut bindings: Vec<(Arc<str>, usize)> = Vec::new();
        let mut declared: HashMap<String, String> = HashMap::new();

        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '{' => {
                    literal_chars += literal.chars().count();
                    escape_literal(&literal, &mut pattern);
                    literal.clear();

                    let close = find_close(&chars, i).ok_or_else(|| {
                        TemplateError::UnbalancedBraces {
                            template: template.to_string(),
                        }
                    })?;
                    let body: String = chars[i + 1..close].iter().collect();
                    let (name, regex) = match body.split_once(':') {
                        Some((n, r)) => (n.trim().to_string(), Some(r.trim().to_string())),
                        None => (body.trim().to_string(), None),
                    };
                    if name.is_empty() {
                        return Err(TemplateError::EmptyName {
                            template: template.to_string(),
                        });
                    }
                    if !valid_name(&name) {
                        return Err(TemplateError::InvalidName {
                            template: template.to_string(),
                            name,
                        });
                    }
                    let regex = match regex {
                        Some(r) if !r.is_empty() => {
                            explicit_regexes += 1;
                            r
                        }
                        _ => DEFAULT_VARIABLE_REGEX.to_string(),
                    };
                    if let Some(first) = declared.get(&name) {
                        if *first != regex {
                            return Err(TemplateError::InconsistentRegex {
                                name,
                                first: first.clone(),
                                second: regex,
                            });
                        }
                    }

                    let inner_groups = Regex::new(&format!("^(?:{regex})$"))
                        .map_err(|e| TemplateError::InvalidRegex {
                            name: name.clone(),
                            regex: regex.clone(),
                            reason: e.to_string(),
                        })?
                        .captures_len()
                        - 1;

                    pattern.push('(');
                    pattern.push_str(&regex);
                    pattern.push(')');
                    group += 1;
                    bindings.push((Arc::from(name.as_str()), group));
                    group += inner_groups;
                    declared.insert(name, regex);
                    i = close + 1;
                }
                '}' => {
                    return Err(TemplateError::UnbalancedBraces {
                        template: template.to_string(),
                    })
                }
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        literal_chars += literal.chars().count();
        escape_literal(&literal, &mut pattern);

        let regex = Regex::new(&format!("^{pattern}(/.*)?$")).map_err(|e| {
            TemplateError::InvalidRegex {
                name: String::new(),
                regex: pattern.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            template: normalized,
            pattern,
            regex,
            bindings,
            remainder_group: group + 1,
            literal_chars,
            explicit_regexes,
        })
    }

    /// Normalized template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Regex source without anchors or the remainder group.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Parameter names in declaration order, duplicates included.
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.bindings.iter().map(|(n, _)| n)
    }

    /// `(name, capture group)` pairs in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[(Arc<str>, usize)] {
        &self.bindings
    }

    #[must_use]
    pub fn literal_chars(&self) -> usize {
        self.literal_chars
    }

    #[must_use]
    pub fn template_variables(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn explicit_regexes(&self) -> usize {
        self.explicit_regexes
    }

    /// Number of capture groups excluding the remainder group.
    #[must_use]
    pub fn capturing_groups(&self) -> usize {
        self.remainder_group - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    /// Match `path` (starting with `/` or empty) against this template.
    #[must_use]
    pub fn matches<'p>(&self, path: &'p str) -> Option<UriMatch<'p>> {
        let caps = self.regex.captures(path)?;
        let remainder = caps
            .get(self.remainder_group)
            .map(|m| m.as_str())
            .unwrap_or("");
        let consumed = &path[..path.len() - remainder.len()];
        let groups = (0..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str()))
            .collect();
        Some(UriMatch {
            consumed,
            remainder,
            groups,
        })
    }

    /// Matching priority: `Ordering::Less` means `self` is tried first.
    ///
    /// More literal characters, then more template variables, then more
    /// explicit regexes, then a shorter template, then the regex text.
    #[must_use]
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        other
            .literal_chars
            .cmp(&self.literal_chars)
            .then_with(|| other.bindings.len().cmp(&self.bindings.len()))
            .then_with(|| other.explicit_regexes.cmp(&self.explicit_regexes))
            .then_with(|| self.template.len().cmp(&other.template.len()))
            .then_with(|| other.pattern.cmp(&self.pattern))
    }
}

/// Index of the `}` closing the placeholder opened at `open`.
fn find_close(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = open;
    while j < chars.len() {
        match chars[j] {
            '\\' => {
                j += 2;
                continue;
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
        j += 1;
    }
    None
}

impl fmt::Debug for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriTemplate")
            .field("template", &self.template)
            .field("pattern", &self.pattern)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.template.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.template)
        }
    }
}

impl PartialEq for UriTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for UriTemplate {}
