//! Resource model: navigation, identity and the concrete object types the
//! store understands out of the box.

mod navigable;
mod object;

pub use navigable::*;
pub use object::*;

#[cfg(test)]
mod resource_test;

use std::fmt;

use serde_json::Value;

/// A watched resource.
///
/// Anything navigable by field path that exposes a stable identity can be
/// indexed and stored.
pub trait Resource: Navigable + Clone + Send + Sync + 'static {
    fn id(&self) -> ResourceId;
}

/// Externally assigned identity of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub namespace: Option<String>,
    pub name: String,
    pub uid: Option<String>,
}

impl ResourceId {
    pub fn new(
        namespace: Option<&str>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
            uid: None,
        }
    }

    pub fn with_uid(
        mut self,
        uid: impl Into<String>,
    ) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Identity equality: uid when both sides carry one, otherwise
    /// namespace + name.
    pub fn same_as(
        &self,
        other: &ResourceId,
    ) -> bool {
        match (&self.uid, &other.uid) {
            (Some(a), Some(b)) => a == b,
            _ => self.namespace == other.namespace && self.name == other.name,
        }
    }

    /// Identity string used by the body cache.
    pub fn cache_key(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}/{}", self.name),
            _ => self.name.clone(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

impl Resource for Value {
    fn id(&self) -> ResourceId {
        let metadata = self.get("metadata");
        let field = |name: &str| metadata.and_then(|m| m.get(name)).and_then(Value::as_str);
        ResourceId {
            namespace: non_empty(field("namespace")),
            name: field("name").unwrap_or_default().to_string(),
            uid: non_empty(field("uid")),
        }
    }
}

impl Resource for DynamicObject {
    fn id(&self) -> ResourceId {
        ResourceId {
            namespace: non_empty(self.metadata.namespace.as_deref()),
            name: self.metadata.name.clone(),
            uid: non_empty(self.metadata.uid.as_deref()),
        }
    }
}
