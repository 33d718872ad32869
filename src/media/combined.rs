use super::media_type::MediaType;
use std::cmp::Ordering;

/// A client type combined with a compatible server type.
///
/// Carries the most specific of the two types, the client quality `q`, the
/// server quality source `qs` and `distance`, the number of wildcard parts
/// that had to be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedMediaType {
    pub combined: MediaType,
    pub q: u16,
    pub qs: u16,
    pub distance: u8,
}

impl CombinedMediaType {
    /// Combine a client type (with quality) and a server type (with `qs`).
    /// Returns `None` when the two are not compatible.
    #[must_use]
    pub fn combine(client: &MediaType, q: u16, server: &MediaType, qs: u16) -> Option<Self> {
        if !client.is_compatible(server) {
            return None;
        }
        let client = client.without_quality();
        let server = server.without_quality();
        let distance = u8::from(client.is_wildcard_type() ^ server.is_wildcard_type())
            + u8::from(client.is_wildcard_subtype() ^ server.is_wildcard_subtype());
        Some(Self {
            combined: MediaType::most_specific(&client, &server).clone(),
            q,
            qs,
            distance,
        })
    }

    /// Fitness ordering; `Ordering::Less` means `self` is the better match.
    ///
    /// Partial order of the combined type first (concrete, then `type/*`,
    /// then `*/*`), then higher `q`, then higher `qs`, then lower distance.
    #[must_use]
    pub fn fitness_cmp(&self, other: &Self) -> Ordering {
        self.combined
            .specificity_rank()
            .cmp(&other.combined.specificity_rank())
            .then_with(|| other.q.cmp(&self.q))
            .then_with(|| other.qs.cmp(&self.qs))
            .then_with(|| self.distance.cmp(&other.distance))
    }
}
