use serde_json::json;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

// Ensures the test subscriber is only installed once per process.
static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

pub fn pod(
    namespace: &str,
    name: &str,
) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "namespace": namespace,
            "name": name,
            "labels": { "app": name },
            "managedFields": [{ "manager": "kubectl" }],
        },
        "spec": { "nodeName": "node-1" },
    })
}

pub fn pod_with_uid(
    namespace: &str,
    name: &str,
    uid: &str,
) -> Value {
    let mut pod = pod(namespace, name);
    pod["metadata"]["uid"] = Value::String(uid.to_string());
    pod
}

pub fn secret(
    namespace: &str,
    name: &str,
) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "namespace": namespace, "name": name },
        "type": "Opaque",
        "data": { "token": format!("{name}-token") },
    })
}
