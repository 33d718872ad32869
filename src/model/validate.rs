use super::method::ResourceMethod;
use super::parameter::Source;
use super::resource::Resource;
use crate::media::MediaType;
use crate::uri::UriTemplate;
use http::Method;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Fatal,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => f.write_str("FATAL"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

/// A problem found while building or validating the resource model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceModelIssue {
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

impl ResourceModelIssue {
    pub fn fatal(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location: location.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for ResourceModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)
    }
}

/// The model contains at least one fatal issue. Carries every issue found.
#[derive(Debug, Clone, Error)]
#[error("resource model validation failed: {} fatal of {} issue(s)", self.fatal_count(), self.issues.len())]
pub struct ModelValidationError {
    pub issues: Vec<ResourceModelIssue>,
}

impl ModelValidationError {
    #[must_use]
    pub fn fatal_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_fatal()).count()
    }
}

#[must_use]
pub fn has_fatal(issues: &[ResourceModelIssue]) -> bool {
    issues.iter().any(ResourceModelIssue::is_fatal)
}

pub fn print_issues(issues: &[ResourceModelIssue]) {
    if issues.is_empty() {
        eprintln!("resource model is valid");
        return;
    }
    eprintln!("\n{} issue(s) found:\n", issues.len());
    for issue in issues {
        eprintln!("{issue}");
    }
}

fn location_of(resource: &Resource) -> String {
    match (resource.names().first(), resource.path()) {
        (Some(name), Some(path)) => format!("{name} [{path}]"),
        (Some(name), None) => name.to_string(),
        (None, Some(path)) => format!("[{path}]"),
        (None, None) => "<anonymous>".to_string(),
    }
}

/// Validate a resource subtree, appending to `issues`.
///
/// `enclosing` holds the template names bound above this node; `None`
/// means the ancestry is unknown (locator results) and path parameter names
/// are not checked.
pub fn validate_resource(
    resource: &Resource,
    enclosing: Option<&[Arc<str>]>,
    issues: &mut Vec<ResourceModelIssue>,
) {
    let location = location_of(resource);
    let mut names: Option<Vec<Arc<str>>> = enclosing.map(<[Arc<str>]>::to_vec);

    if let Some(path) = resource.path() {
        match UriTemplate::compile(path) {
            Ok(template) => {
                if let Some(names) = names.as_mut() {
                    names.extend(template.names().cloned());
                }
            }
            Err(e) => issues.push(ResourceModelIssue::fatal(&location, e.to_string())),
        }
    }

    issues.extend(resource.issues().iter().cloned());

    for method in resource.methods.iter().chain(resource.locators.iter()) {
        validate_method(method, names.as_deref(), issues);
    }

    if resource.locators.len() > 1 {
        issues.push(ResourceModelIssue::fatal(
            &location,
            format!("{} sub-resource locators share one path", resource.locators.len()),
        ));
    }
    if !resource.methods.is_empty() && !resource.locators.is_empty() {
        issues.push(ResourceModelIssue::warning(
            &location,
            "sub-resource locator and resource methods share a path; methods win for the exact path",
        ));
    }

    let methods: Vec<&ResourceMethod> = resource.methods.iter().collect();
    check_ambiguity(&methods, &location, issues);

    for child in resource.children() {
        validate_resource(child, names.as_deref(), issues);
    }
}

/// Per-method checks: media types, entity/form parameters, path parameter names.
pub fn validate_method(
    method: &ResourceMethod,
    template_names: Option<&[Arc<str>]>,
    issues: &mut Vec<ResourceModelIssue>,
) {
    let location = method.location();

    for invalid in &method.invalid_media {
        issues.push(ResourceModelIssue::fatal(&location, invalid.clone()));
    }
    for produced in method.produces() {
        if let Err(e) = produced.quality_source() {
            issues.push(ResourceModelIssue::fatal(&location, format!("invalid qs: {e}")));
        }
    }

    let entities = method.parameters().iter().filter(|p| p.is_entity()).count();
    if entities > 1 {
        issues.push(ResourceModelIssue::fatal(
            &location,
            format!("{entities} entity parameters declared, at most one is allowed"),
        ));
    }

    if method.is_locator() {
        if entities > 0 {
            issues.push(ResourceModelIssue::fatal(
                &location,
                "sub-resource locator must not declare an entity parameter",
            ));
        }
    } else if method.http_method() == Some(&Method::GET) {
        if entities > 0 {
            issues.push(ResourceModelIssue::warning(
                &location,
                "GET method declares an entity parameter",
            ));
        }
        if method.parameters().iter().any(|p| p.source == Source::Form) {
            issues.push(ResourceModelIssue::fatal(
                &location,
                "GET method must not declare form parameters",
            ));
        }
    }

    if let Some(names) = template_names {
        for p in method.parameters().iter().filter(|p| p.source == Source::Path) {
            if !names.iter().any(|n| *n == p.name) {
                issues.push(ResourceModelIssue::warning(
                    &location,
                    format!("path parameter `{}` is not bound by any enclosing template", p.name),
                ));
            }
        }
    }
}

fn essences(types: &[MediaType]) -> Vec<String> {
    let mut out: Vec<String> = types.iter().map(MediaType::essence).collect();
    out.sort();
    out.dedup();
    out
}

fn overlaps(a: &[MediaType], b: &[MediaType]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.is_compatible(y)))
}

/// Pairwise check of methods sharing one node.
///
/// Same verb with identical consumes and produces is FATAL; same verb with
/// merely overlapping consumes and produces is a WARNING.
pub fn check_ambiguity(
    methods: &[&ResourceMethod],
    location: &str,
    issues: &mut Vec<ResourceModelIssue>,
) {
    for (i, a) in methods.iter().enumerate() {
        for b in &methods[i + 1..] {
            let (Some(verb_a), Some(verb_b)) = (a.http_method(), b.http_method()) else {
                continue;
            };
            if verb_a != verb_b {
                continue;
            }
            let (ca, cb) = (a.effective_consumes(), b.effective_consumes());
            let (pa, pb) = (a.effective_produces(), b.effective_produces());
            if essences(&ca) == essences(&cb) && essences(&pa) == essences(&pb) {
                issues.push(ResourceModelIssue::fatal(
                    location,
                    format!(
                        "{verb_a} methods `{}` and `{}` have identical consumes and produces",
                        a.location(),
                        b.location()
                    ),
                ));
            } else if overlaps(&ca, &cb) && overlaps(&pa, &pb) {
                issues.push(ResourceModelIssue::warning(
                    location,
                    format!(
                        "{verb_a} methods `{}` and `{}` overlap in consumes and produces",
                        a.location(),
                        b.location()
                    ),
                ));
            }
        }
    }
}
