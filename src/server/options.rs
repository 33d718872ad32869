use super::response::Response;
use crate::exception::HandlerError;
use crate::media::{parse_accept, RESOURCE_DESCRIPTION_TYPE};
use crate::runtime::RuntimeResource;
use http::Method;

/// Build the synthesized OPTIONS response for `node`.
///
/// The first acceptable type decides the body: `text/plain` gets the verb
/// list, JSON or the resource description type get the node description,
/// any other concrete type gets an empty body of that type, and a wildcard
/// gets the description when `describe` is set (text otherwise).
///
/// # Errors
///
/// 400 for a malformed Accept header.
pub fn options_response(
    node: &RuntimeResource,
    allow: &[Method],
    accept: Option<&str>,
    describe: bool,
) -> Result<Response, HandlerError> {
    let allow_header = allow
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let acceptable = parse_accept(accept)
        .map_err(|e| HandlerError::bad_request(format!("invalid Accept header: {e}")))?;
    let Some(preferred) = acceptable.first() else {
        return Err(HandlerError::not_acceptable("no acceptable representation"));
    };
    let media = &preferred.media;
    let response = Response::ok().header("Allow", &allow_header);

    let description = || {
        serde_json::to_vec_pretty(&node.describe()).unwrap_or_default()
    };
    let text = || allow_header.clone().into_bytes();

    let essence = media.essence();
    let response = if media.is_concrete() {
        match essence.as_str() {
            "text/plain" => response.content_type("text/plain").body(text()),
            "application/json" | RESOURCE_DESCRIPTION_TYPE => {
                response.content_type(&essence).body(description())
            }
            _ => response.content_type(&media.to_string()),
        }
    } else if describe && (media.is_wildcard_type() || media.kind() == "application") {
        response
            .content_type(RESOURCE_DESCRIPTION_TYPE)
            .body(description())
    } else {
        response.content_type("text/plain").body(text())
    };
    Ok(response)
}
