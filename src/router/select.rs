//! Method selection for a matched node: verb filtering with HEAD and
//! OPTIONS synthesis, the Content-Type filter and Accept negotiation.

use crate::exception::HandlerError;
use crate::media::{
    parse_accept, CombinedMediaType, MediaType, APPLICATION_OCTET_STREAM_TYPE, MAX_QUALITY,
    WILDCARD_TYPE,
};
use crate::model::ResourceMethod;
use crate::runtime::RuntimeResource;
use http::Method;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// The method chosen for a request.
#[derive(Debug, Clone)]
pub struct Selected {
    pub method: ResourceMethod,
    pub node: Arc<RuntimeResource>,
    pub response_type: MediaType,
    /// A GET method answering a HEAD request.
    pub synthesized_head: bool,
}

/// What routing decided.
#[derive(Debug, Clone)]
pub enum Outcome {
    Method(Selected),
    /// OPTIONS on a node without an explicit OPTIONS method.
    Options {
        node: Arc<RuntimeResource>,
        allow: Vec<Method>,
    },
}

struct Candidate<'a> {
    method: &'a ResourceMethod,
    produces: Vec<MediaType>,
    synthesized: bool,
}

/// `Allow` for a node: declared verbs, HEAD when GET exists, and OPTIONS.
#[must_use]
pub fn allowed_methods(node: &RuntimeResource) -> Vec<Method> {
    let mut allow = node.http_methods();
    if allow.contains(&Method::GET) && !allow.contains(&Method::HEAD) {
        allow.push(Method::HEAD);
    }
    if !allow.contains(&Method::OPTIONS) {
        allow.push(Method::OPTIONS);
    }
    allow
}

fn candidates<'a>(node: &'a RuntimeResource, verb: &Method) -> Vec<Candidate<'a>> {
    let mut out: Vec<Candidate<'a>> = node
        .methods()
        .iter()
        .filter(|m| m.http_method() == Some(verb))
        .map(|m| Candidate {
            method: m,
            produces: m.effective_produces(),
            synthesized: false,
        })
        .collect();

    if *verb == Method::HEAD {
        let covered: Vec<MediaType> = out.iter().flat_map(|c| c.produces.clone()).collect();
        for get in node
            .methods()
            .iter()
            .filter(|m| m.http_method() == Some(&Method::GET))
        {
            let uncovered: Vec<MediaType> = get
                .effective_produces()
                .into_iter()
                .filter(|p| !covered.iter().any(|h| h.same_essence(p)))
                .collect();
            if !uncovered.is_empty() {
                out.push(Candidate {
                    method: get,
                    produces: uncovered,
                    synthesized: true,
                });
            }
        }
    }
    out
}

struct Best<'a> {
    produces: CombinedMediaType,
    consumes: CombinedMediaType,
    index: usize,
    candidate: &'a Candidate<'a>,
}

fn compare(a: &Best<'_>, produces: &CombinedMediaType, consumes: &CombinedMediaType) -> Ordering {
    produces
        .fitness_cmp(&a.produces)
        .then_with(|| consumes.fitness_cmp(&a.consumes))
}

/// Resolve a wildcard negotiation result to a concrete response type.
fn response_type(combined: &MediaType) -> Option<MediaType> {
    if combined.is_concrete() {
        return Some(combined.clone());
    }
    if combined.is_wildcard_type() || combined.kind() == "application" {
        return Some(APPLICATION_OCTET_STREAM_TYPE.clone());
    }
    None
}

/// Select the single method of `node` that serves the request.
///
/// # Errors
///
/// 405 with `Allow` for an unsupported verb, 415 when no method consumes
/// the request Content-Type, 400 for a malformed Content-Type or Accept,
/// 406 when nothing acceptable can be produced.
pub fn select_method(
    node: &Arc<RuntimeResource>,
    verb: &Method,
    content_type: Option<&str>,
    accept: Option<&str>,
) -> Result<Outcome, HandlerError> {
    let candidates = candidates(node, verb);
    if candidates.is_empty() {
        let allow = allowed_methods(node);
        if *verb == Method::OPTIONS {
            return Ok(Outcome::Options {
                node: Arc::clone(node),
                allow,
            });
        }
        warn!(method = %verb, template = %node.template(), "method not allowed");
        return Err(HandlerError::method_not_allowed(&allow));
    }

    let request_type = match content_type {
        Some(raw) => MediaType::parse(raw)
            .map_err(|e| HandlerError::bad_request(format!("invalid Content-Type: {e}")))?,
        None => WILDCARD_TYPE.clone(),
    };
    let acceptors: Vec<&Candidate<'_>> = candidates
        .iter()
        .filter(|c| {
            c.method
                .effective_consumes()
                .iter()
                .any(|m| m.is_compatible(&request_type))
        })
        .collect();
    if acceptors.is_empty() {
        warn!(content_type = %request_type, "no method consumes the request entity");
        return Err(HandlerError::unsupported_media_type(format!(
            "no method consumes {request_type}"
        )));
    }

    let acceptable = parse_accept(accept)
        .map_err(|e| HandlerError::bad_request(format!("invalid Accept header: {e}")))?;

    let mut best: Option<Best<'_>> = None;
    let mut tied: Option<usize> = None;
    for (index, &candidate) in acceptors.iter().enumerate() {
        for consumed in candidate.method.effective_consumes() {
            let Some(consumes) =
                CombinedMediaType::combine(&request_type, MAX_QUALITY, &consumed, MAX_QUALITY)
            else {
                continue;
            };
            for produced in &candidate.produces {
                let qs = produced.quality_source().unwrap_or(MAX_QUALITY);
                for entry in &acceptable {
                    let Some(produces) =
                        CombinedMediaType::combine(&entry.media, entry.quality, produced, qs)
                    else {
                        continue;
                    };
                    let ordering = match &best {
                        Some(current) => compare(current, &produces, &consumes),
                        None => Ordering::Less,
                    };
                    match ordering {
                        Ordering::Less => {
                            tied = None;
                            best = Some(Best {
                                produces,
                                consumes: consumes.clone(),
                                index,
                                candidate,
                            });
                        }
                        Ordering::Equal => {
                            if best.as_ref().is_some_and(|b| b.index != index) {
                                tied = Some(index);
                            }
                        }
                        Ordering::Greater => {}
                    }
                }
            }
        }
    }

    let Some(best) = best else {
        warn!(accept = accept.unwrap_or("*/*"), "no acceptable representation");
        return Err(HandlerError::not_acceptable("no acceptable representation"));
    };
    if let Some(other) = tied {
        warn!(
            selected = %best.candidate.method.location(),
            other = %acceptors[other].method.location(),
            media_type = %best.produces.combined,
            "ambiguous method selection; first declared method wins"
        );
    }

    let Some(response_type) = response_type(&best.produces.combined) else {
        return Err(HandlerError::not_acceptable(format!(
            "cannot resolve {} to a concrete type",
            best.produces.combined
        )));
    };
    debug!(
        method = %best.candidate.method.location(),
        response_type = %response_type,
        synthesized_head = best.candidate.synthesized,
        "method selected"
    );
    Ok(Outcome::Method(Selected {
        method: best.candidate.method.clone(),
        node: Arc::clone(node),
        response_type,
        synthesized_head: best.candidate.synthesized,
    }))
}
