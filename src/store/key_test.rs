use super::*;

#[test]
fn test_prefix_match_is_element_wise() {
    let key = IndexKey::from(["ns", "app", "web"]);

    assert!(key.starts_with(&IndexKey::from(["ns"])));
    assert!(key.starts_with(&IndexKey::from(["ns", "app"])));
    assert!(key.starts_with(&IndexKey::default()));
    assert!(!key.starts_with(&IndexKey::from(["n"])));
    assert!(!key.starts_with(&IndexKey::from(["ns", "app", "web", "x"])));
}

#[test]
fn test_separator_inside_part_does_not_collide() {
    let joined = IndexKey::from(["a/b"]);
    let split = IndexKey::from(["a", "b"]);

    assert_eq!(joined.to_string(), split.to_string());
    assert_ne!(joined, split);
    assert!(!split.starts_with(&IndexKey::from(["a/b"])));
}
