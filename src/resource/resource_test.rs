use serde_json::json;

use super::*;

#[test]
fn test_json_identity_reads_metadata() {
    let value = json!({"metadata": {"namespace": "ns", "name": "a", "uid": "u-1"}});
    let id = value.id();
    assert_eq!(id.namespace.as_deref(), Some("ns"));
    assert_eq!(id.name, "a");
    assert_eq!(id.uid.as_deref(), Some("u-1"));
    assert_eq!(id.cache_key(), "ns/a");
}

#[test]
fn test_cluster_scoped_identity_has_no_namespace() {
    let id = json!({"metadata": {"name": "node-1", "namespace": ""}}).id();
    assert_eq!(id.namespace, None);
    assert_eq!(id.cache_key(), "node-1");
    assert_eq!(id.to_string(), "node-1");
}

#[test]
fn test_same_as_prefers_uid() {
    let a = ResourceId::new(Some("ns"), "a").with_uid("u-1");
    let recreated = ResourceId::new(Some("ns"), "a").with_uid("u-2");
    let renamed = ResourceId::new(Some("ns"), "b").with_uid("u-1");

    assert!(!a.same_as(&recreated));
    assert!(a.same_as(&renamed));
}

#[test]
fn test_same_as_falls_back_to_namespace_and_name() {
    let a = ResourceId::new(Some("ns"), "a").with_uid("u-1");
    assert!(a.same_as(&ResourceId::new(Some("ns"), "a")));
    assert!(!a.same_as(&ResourceId::new(Some("other"), "a")));
    assert!(!a.same_as(&ResourceId::new(None, "a")));
}

#[test]
fn test_dynamic_object_identity() {
    let obj = DynamicObject::new(
        "v1",
        "Pod",
        ObjectMeta {
            name: "p".into(),
            namespace: Some("default".into()),
            uid: Some("u-9".into()),
            ..Default::default()
        },
    );
    assert_eq!(obj.id(), ResourceId::new(Some("default"), "p").with_uid("u-9"));
}
