use serde_json::json;

use super::*;
use crate::PathError;

fn field(name: &str) -> Segment {
    Segment::Field(name.to_string())
}

#[test]
fn test_parse_dotted_names() {
    let path = FieldPath::parse("metadata.namespace").unwrap();
    assert_eq!(path.segments(), &[field("metadata"), field("namespace")]);
    assert_eq!(path.expression(), "metadata.namespace");
}

#[test]
fn test_parse_strips_wrappers_and_root_markers() {
    let expected = vec![field("metadata"), field("name")];
    for expr in [
        "metadata.name",
        ".metadata.name",
        "$.metadata.name",
        "{.metadata.name}",
        " { $.metadata.name } ",
    ] {
        assert_eq!(FieldPath::parse(expr).unwrap().segments(), expected.as_slice(), "{expr}");
    }
}

#[test]
fn test_parse_bracket_selectors() {
    let path = FieldPath::parse("metadata.labels['app.kubernetes.io/name']").unwrap();
    assert_eq!(
        path.segments(),
        &[field("metadata"), field("labels"), field("app.kubernetes.io/name")]
    );

    let path = FieldPath::parse(r#"spec.containers[0]["image"]"#).unwrap();
    assert_eq!(
        path.segments(),
        &[field("spec"), field("containers"), Segment::Index(0), field("image")]
    );

    let path = FieldPath::parse("spec.containers[ * ].name").unwrap();
    assert_eq!(
        path.segments(),
        &[field("spec"), field("containers"), Segment::Wildcard, field("name")]
    );

    let path = FieldPath::parse("metadata.annotations.*").unwrap();
    assert_eq!(path.segments()[2], Segment::Wildcard);
}

#[test]
fn test_parse_quoted_escape() {
    let path = FieldPath::parse(r"data['it\'s']").unwrap();
    assert_eq!(path.segments(), &[field("data"), field("it's")]);
}

#[test]
fn test_parse_rejects_empty_expressions() {
    assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
    assert_eq!(FieldPath::parse("   "), Err(PathError::Empty));
    assert_eq!(FieldPath::parse("$"), Err(PathError::Empty));
    assert_eq!(FieldPath::parse("{}"), Err(PathError::Empty));
}

#[test]
fn test_parse_rejects_empty_segments() {
    assert!(matches!(
        FieldPath::parse("metadata..name"),
        Err(PathError::EmptySegment { offset: 9, .. })
    ));
    assert!(matches!(
        FieldPath::parse("metadata."),
        Err(PathError::EmptySegment { offset: 9, .. })
    ));
    assert!(matches!(
        FieldPath::parse("items.[0]"),
        Err(PathError::EmptySegment { .. })
    ));
}

#[test]
fn test_parse_rejects_malformed_brackets() {
    assert!(matches!(
        FieldPath::parse("labels['app"),
        Err(PathError::Unterminated { .. })
    ));
    assert!(matches!(FieldPath::parse("items[0"), Err(PathError::Unterminated { .. })));
    assert!(matches!(
        FieldPath::parse("{.metadata.name"),
        Err(PathError::Unterminated { .. })
    ));
    assert!(matches!(
        FieldPath::parse("items[-1]"),
        Err(PathError::InvalidSelector { selector, .. }) if selector == "-1"
    ));
    assert!(matches!(
        FieldPath::parse("items[]"),
        Err(PathError::InvalidSelector { .. })
    ));
    assert!(matches!(
        FieldPath::parse("items[0]name"),
        Err(PathError::UnexpectedChar { found: 'n', .. })
    ));
    assert!(matches!(
        FieldPath::parse("meta data"),
        Err(PathError::UnexpectedChar { found: ' ', .. })
    ));
}

#[test]
fn test_evaluate_returns_matches_in_document_order() {
    let doc = json!({
        "spec": {"containers": [{"image": "a:1"}, {"image": "b:2"}, {"name": "no-image"}]}
    });

    let path = FieldPath::parse("spec.containers[*].image").unwrap();
    let rendered: Vec<String> = path.evaluate(&doc).iter().map(|n| n.render()).collect();
    assert_eq!(rendered, vec!["a:1", "b:2"]);

    let path = FieldPath::parse("spec.containers[1].image").unwrap();
    assert_eq!(path.evaluate(&doc)[0].render(), "b:2");
}

#[test]
fn test_evaluate_missing_or_scalar_paths_yield_nothing() {
    let doc = json!({"metadata": {"name": "x"}});
    assert!(FieldPath::parse("metadata.namespace").unwrap().evaluate(&doc).is_empty());
    assert!(FieldPath::parse("metadata.name.first").unwrap().evaluate(&doc).is_empty());
    assert!(FieldPath::parse("metadata[0]").unwrap().evaluate(&doc).is_empty());
}

#[test]
fn test_evaluate_keeps_null_leaf() {
    let doc = json!({"spec": {"nodeName": null}});
    let matches = FieldPath::parse("spec.nodeName").unwrap().evaluate(&doc);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].is_null());
    assert_eq!(matches[0].render(), "");
}

#[test]
fn test_overlaps() {
    let parse = |s: &str| FieldPath::parse(s).unwrap();

    assert!(parse("metadata").overlaps(&parse("metadata.name")));
    assert!(parse("metadata.name").overlaps(&parse("metadata")));
    assert!(parse("metadata.Name").overlaps(&parse("metadata.name")));
    assert!(parse("metadata.*").overlaps(&parse("metadata.labels['app']")));
    assert!(!parse("metadata.managedFields").overlaps(&parse("metadata.name")));
    assert!(!parse("spec.items[0]").overlaps(&parse("spec.items[1].name")));
}

#[test]
fn test_display_roundtrips_expression() {
    let path: FieldPath = "{.metadata.labels['app']}".parse().unwrap();
    assert_eq!(path.to_string(), "{.metadata.labels['app']}");
    assert_eq!(field("app.kubernetes.io/name").to_string(), "['app.kubernetes.io/name']");
    assert_eq!(Segment::Index(3).to_string(), "[3]");
}
