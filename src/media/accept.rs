use super::media_type::{parse_quality, split_unquoted, MediaType, MediaTypeError, MAX_QUALITY};

/// One entry of a parsed `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptableMediaType {
    pub media: MediaType,
    /// Quality in millis (0..=1000).
    pub quality: u16,
}

impl AcceptableMediaType {
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            media: MediaType::new("*", "*"),
            quality: MAX_QUALITY,
        }
    }
}

/// Parse an `Accept` header into acceptable types, most preferred first.
///
/// A missing or blank header accepts `*/*`. Entries with `q=0` are dropped
/// after validation. Ordering is quality descending, then concrete before
/// `type/*` before `*/*`, then more parameters first; equal entries keep
/// header order.
///
/// # Errors
///
/// A malformed media type or quality value fails the whole header.
pub fn parse_accept(header: Option<&str>) -> Result<Vec<AcceptableMediaType>, MediaTypeError> {
    let header = match header.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => return Ok(vec![AcceptableMediaType::wildcard()]),
    };

    let mut entries = Vec::new();
    for raw in split_unquoted(header, ',') {
        if raw.trim().is_empty() {
            continue;
        }
        let parsed = MediaType::parse(raw)?;
        let quality = match parsed.param("q") {
            Some(q) => parse_quality(q)?,
            None => MAX_QUALITY,
        };
        entries.push(AcceptableMediaType {
            media: parsed.without_quality(),
            quality,
        });
    }

    entries.retain(|e| e.quality > 0);
    entries.sort_by(|a, b| {
        b.quality
            .cmp(&a.quality)
            .then_with(|| a.media.specificity_rank().cmp(&b.media.specificity_rank()))
            .then_with(|| b.media.params().len().cmp(&a.media.params().len()))
    });
    Ok(entries)
}
