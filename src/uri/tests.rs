use super::*;
use std::cmp::Ordering;

fn compile(t: &str) -> UriTemplate {
    UriTemplate::compile(t).unwrap()
}

#[test]
fn test_normalize() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("/"), "");
    assert_eq!(normalize("a/b/"), "/a/b");
    assert_eq!(normalize("//a"), "/a");
}

#[test]
fn test_literal_template_consumes_prefix() {
    let t = compile("parent");
    let m = t.matches("/parent/child/first").unwrap();
    assert_eq!(m.consumed, "/parent");
    assert_eq!(m.remainder, "/child/first");
    assert!(t.matches("/parentx").is_none());
    assert_eq!(t.literal_chars(), 7);
}

#[test]
fn test_default_variable_is_one_segment() {
    let t = compile("child/{id}");
    let m = t.matches("/child/first/second").unwrap();
    assert_eq!(m.consumed, "/child/first");
    assert_eq!(m.remainder, "/second");
    let (name, group) = &t.bindings()[0];
    assert_eq!(name.as_ref(), "id");
    assert_eq!(m.group(*group), Some("first"));
}

#[test]
fn test_explicit_regex_with_inner_groups() {
    let t = compile("{a: (x|y)(z)?}/{b}");
    assert_eq!(t.explicit_regexes(), 1);
    assert_eq!(t.template_variables(), 2);
    let m = t.matches("/xz/tail").unwrap();
    let groups: Vec<_> = t.bindings().iter().map(|(_, g)| m.group(*g)).collect();
    assert_eq!(groups, vec![Some("xz"), Some("tail")]);
    assert_eq!(m.remainder, "");
}

#[test]
fn test_catch_all_regex_spans_slashes() {
    let t = compile("files/{path: .*}");
    let m = t.matches("/files/a/b/c.txt").unwrap();
    assert_eq!(m.group(t.bindings()[0].1), Some("a/b/c.txt"));
    assert_eq!(m.remainder, "");
}

#[test]
fn test_repeated_name_requires_same_regex() {
    assert!(UriTemplate::compile("{x}/{x}").is_ok());
    let err = UriTemplate::compile("{x: \\d+}/{x: [a-z]+}").unwrap_err();
    assert!(matches!(err, TemplateError::InconsistentRegex { .. }));
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(
        UriTemplate::compile("a/{b"),
        Err(TemplateError::UnbalancedBraces { .. })
    ));
    assert!(matches!(
        UriTemplate::compile("a/b}"),
        Err(TemplateError::UnbalancedBraces { .. })
    ));
    assert!(matches!(
        UriTemplate::compile("{: x}"),
        Err(TemplateError::EmptyName { .. })
    ));
    assert!(matches!(
        UriTemplate::compile("{x: (}"),
        Err(TemplateError::InvalidRegex { .. })
    ));
}

#[test]
fn test_regex_with_braces_quantifier() {
    let t = compile("zip/{code: \\d{5}}");
    assert!(t.matches("/zip/12345").is_some());
    assert!(t.matches("/zip/1234").is_none());
}

#[test]
fn test_literal_is_escaped_and_percent_case_insensitive() {
    let t = compile("a.b/my%20file");
    assert!(t.matches("/a.b/my%20file").is_some());
    assert!(t.matches("/axb/my%20file").is_none());
    let t = compile("x%2fy");
    assert!(t.matches("/x%2Fy").is_some());
}

#[test]
fn test_literal_is_percent_encoded() {
    let t = compile("a b");
    assert!(t.matches("/a%20b").is_some());
    assert!(t.matches("/a b").is_none());
    let t = compile("café/menu");
    assert!(t.matches("/caf%C3%A9/menu").is_some());
    assert!(t.matches("/caf%c3%a9/menu").is_some());
    let t = compile("100%/x");
    assert!(t.matches("/100%25/x").is_some());
    let t = compile("a:d@e,f");
    assert!(t.matches("/a:d@e,f").is_some());
}

#[test]
fn test_empty_template_matches_everything() {
    let t = compile("/");
    assert!(t.is_empty());
    let m = t.matches("/anything/here").unwrap();
    assert_eq!(m.consumed, "");
    assert_eq!(m.remainder, "/anything/here");
}

#[test]
fn test_priority_prefers_literal_characters() {
    let literal = compile("{abc}/a");
    let vars = compile("{xyz}/{sub-x}");
    assert_eq!(literal.priority_cmp(&vars), Ordering::Less);

    let fixed = compile("fixed");
    let var = compile("{x}");
    assert_eq!(fixed.priority_cmp(&var), Ordering::Less);
}

#[test]
fn test_priority_then_variables_then_explicit_regexes() {
    let two = compile("a/{x}/{y}");
    let one = compile("a/{x}");
    // "a/{x}/{y}" has one more literal "/" as well
    assert_eq!(two.priority_cmp(&one), Ordering::Less);

    let explicit = compile("{x: [0-9]+}");
    let default = compile("{x}");
    assert_eq!(explicit.priority_cmp(&default), Ordering::Less);
}

#[test]
fn test_strip_matrix() {
    assert_eq!(strip_matrix("/p;x=1;y=1/q"), "/p/q");
    assert_eq!(strip_matrix("/plain"), "/plain");
}

#[test]
fn test_path_segments_with_matrix() {
    let segments = path_segments("/p1;x=1;y=1/p2;x=2/my%20seg", true);
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].path, "p1");
    assert_eq!(segments[0].matrix_param("y"), Some("1"));
    assert_eq!(segments[1].matrix_param("x"), Some("2"));
    assert_eq!(segments[2].path, "my seg");

    let encoded = path_segments("/my%20seg", false);
    assert_eq!(encoded[0].path, "my%20seg");
}

#[test]
fn test_path_segments_keep_empty_inner_segments() {
    let segments = path_segments("/p//p", true);
    let paths: Vec<_> = segments.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, vec!["p", "", "p"]);
}

#[test]
fn test_parse_query_decoded_and_raw() {
    let decoded = parse_query("verbose=true&item=1&item=2&name=a+b%21", true);
    assert_eq!(decoded.len(), 4);
    assert_eq!(decoded[3], ("name".to_string(), "a b!".to_string()));

    let raw = parse_query("name=a+b%21&flag", false);
    assert_eq!(raw[0].1, "a+b%21");
    assert_eq!(raw[1], ("flag".to_string(), String::new()));
}
