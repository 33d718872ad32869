//! Media types, `Accept` header parsing and combined client/server types
//! used by content negotiation.

mod accept;
mod combined;
mod media_type;

#[cfg(test)]
mod tests;

pub use accept::{parse_accept, AcceptableMediaType};
pub use combined::CombinedMediaType;
pub use media_type::{
    parse_quality, MediaType, MediaTypeError, APPLICATION_FORM_URLENCODED_TYPE,
    APPLICATION_JSON_TYPE, APPLICATION_OCTET_STREAM_TYPE, MAX_QUALITY,
    RESOURCE_DESCRIPTION_TYPE, TEXT_PLAIN_TYPE, WILDCARD_TYPE,
};

/// Parse a list of media type strings, each of which may itself be a
/// comma-separated list.
///
/// # Errors
///
/// Returns the first malformed entry.
pub fn parse_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<MediaType>, MediaTypeError> {
    let mut out = Vec::new();
    for value in values {
        for part in media_type::split_unquoted(value.as_ref(), ',') {
            if !part.trim().is_empty() {
                out.push(MediaType::parse(part)?);
            }
        }
    }
    Ok(out)
}
