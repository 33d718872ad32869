use super::*;
use std::cmp::Ordering;

fn mt(s: &str) -> MediaType {
    MediaType::parse(s).unwrap()
}

#[test]
fn test_parse_media_type_with_params() {
    let m = mt("Text/HTML; charset=\"utf-8\"; level=1");
    assert_eq!(m.kind(), "text");
    assert_eq!(m.subtype(), "html");
    assert_eq!(m.param("charset"), Some("utf-8"));
    assert_eq!(m.param("LEVEL"), Some("1"));
    assert_eq!(m.to_string(), "text/html;charset=utf-8;level=1");
}

#[test]
fn test_bare_star_is_full_wildcard() {
    let m = mt("*");
    assert!(m.is_wildcard_type());
    assert!(m.is_wildcard_subtype());
    assert_eq!(m.specificity_rank(), 2);
}

#[test]
fn test_specificity_rank_counts_wildcards() {
    assert_eq!(mt("text/plain").specificity_rank(), 0);
    assert_eq!(mt("text/*").specificity_rank(), 1);
    assert_eq!(mt("*/*").specificity_rank(), 2);
    assert!(mt("text/*").specificity_rank() < mt("*/*").specificity_rank());
}

#[test]
fn test_malformed_media_types() {
    for bad in ["", "text", "text/", "/plain", "*/plain", "te xt/plain", "text/plain;charset"] {
        assert!(
            matches!(MediaType::parse(bad), Err(MediaTypeError::Malformed { .. })),
            "{bad} should be malformed"
        );
    }
}

#[test]
fn test_compatibility() {
    assert!(mt("text/plain").is_compatible(&mt("text/*")));
    assert!(mt("*/*").is_compatible(&mt("application/json")));
    assert!(!mt("text/plain").is_compatible(&mt("text/html")));
    assert!(!mt("text/*").is_compatible(&mt("application/*")));
}

#[test]
fn test_quality_values() {
    assert_eq!(parse_quality("1"), Ok(1000));
    assert_eq!(parse_quality("1.000"), Ok(1000));
    assert_eq!(parse_quality("0"), Ok(0));
    assert_eq!(parse_quality("0.5"), Ok(500));
    assert_eq!(parse_quality("0.25"), Ok(250));
    assert_eq!(parse_quality("0.125"), Ok(125));
    assert_eq!(parse_quality("0."), Ok(0));
    for bad in ["1.1", "0.1234", "2", "-0.5", "1.0001", "abc", "", "0.a"] {
        assert!(
            matches!(parse_quality(bad), Err(MediaTypeError::InvalidQuality { .. })),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn test_accept_defaults_to_wildcard() {
    let accept = parse_accept(None).unwrap();
    assert_eq!(accept, vec![AcceptableMediaType::wildcard()]);
    assert_eq!(parse_accept(Some("  ")).unwrap().len(), 1);
}

#[test]
fn test_accept_sorted_by_quality_then_specificity() {
    let accept =
        parse_accept(Some("application/foo;q=0.4, application/bar;q=0.2, application/baz, */*;q=0.4, text/*;q=0.4"))
            .unwrap();
    let order: Vec<String> = accept.iter().map(|a| a.media.to_string()).collect();
    assert_eq!(
        order,
        vec!["application/baz", "application/foo", "text/*", "*/*", "application/bar"]
    );
    assert_eq!(accept[0].quality, 1000);
    assert_eq!(accept[4].quality, 200);
}

#[test]
fn test_accept_rejects_bad_quality() {
    assert!(parse_accept(Some("text/plain;q=1.1")).is_err());
    assert!(parse_accept(Some("text/plain;q=0.1234")).is_err());
}

#[test]
fn test_accept_drops_zero_quality() {
    let accept = parse_accept(Some("text/plain;q=0, application/json")).unwrap();
    assert_eq!(accept.len(), 1);
    assert_eq!(accept[0].media, mt("application/json"));
}

#[test]
fn test_accept_quoted_comma() {
    let accept = parse_accept(Some("text/plain;x=\"a,b\", application/json")).unwrap();
    assert_eq!(accept.len(), 2);
    assert_eq!(accept[0].media.param("x"), Some("a,b"));
}

#[test]
fn test_combined_prefers_specific_then_quality() {
    let concrete = CombinedMediaType::combine(&mt("text/plain"), 100, &mt("text/plain"), 1000).unwrap();
    let wildcard = CombinedMediaType::combine(&mt("*/*"), 1000, &mt("*/*"), 1000).unwrap();
    assert_eq!(concrete.fitness_cmp(&wildcard), Ordering::Less);

    let high = CombinedMediaType::combine(&mt("application/baz"), 1000, &mt("application/baz"), 1000).unwrap();
    let low = CombinedMediaType::combine(&mt("application/foo"), 400, &mt("application/foo"), 1000).unwrap();
    assert_eq!(high.fitness_cmp(&low), Ordering::Less);
}

#[test]
fn test_combined_uses_most_specific_and_distance() {
    let c = CombinedMediaType::combine(&mt("*/*"), 1000, &mt("application/json"), 1000).unwrap();
    assert_eq!(c.combined, mt("application/json"));
    assert_eq!(c.distance, 2);

    let exact = CombinedMediaType::combine(&mt("application/json"), 1000, &mt("application/json"), 1000).unwrap();
    assert_eq!(exact.distance, 0);
    assert_eq!(exact.fitness_cmp(&c), Ordering::Less);

    assert!(CombinedMediaType::combine(&mt("text/plain"), 1000, &mt("application/json"), 1000).is_none());
}

#[test]
fn test_qs_breaks_quality_ties() {
    let server_high = mt("application/xml;qs=0.9");
    let server_low = mt("application/json;qs=0.5");
    let a = CombinedMediaType::combine(&mt("*/*"), 1000, &server_high, server_high.quality_source().unwrap()).unwrap();
    let b = CombinedMediaType::combine(&mt("*/*"), 1000, &server_low, server_low.quality_source().unwrap()).unwrap();
    assert_eq!(a.fitness_cmp(&b), Ordering::Less);
    assert_eq!(a.combined.param("qs"), None);
}

#[test]
fn test_parse_list_splits_commas() {
    let list = parse_list(&["text/plain, application/json", "text/html"]).unwrap();
    assert_eq!(list.len(), 3);
}
