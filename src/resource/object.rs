//! Record-shaped resource types.
//!
//! Fields of a record can never be removed, only zeroed. Path segments are
//! matched against the wire (camelCase) field names, falling back to a
//! case-insensitive comparison so `metadata.ManagedFields` and
//! `metadata.managedfields` address the same field.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::resolve_field;
use super::Navigable;
use super::Shape;
use crate::Segment;

const META_FIELDS: &[&str] = &[
    "name",
    "namespace",
    "uid",
    "resourceVersion",
    "generation",
    "creationTimestamp",
    "labels",
    "annotations",
    "ownerReferences",
    "finalizers",
    "managedFields",
];

const OBJECT_FIELDS: &[&str] = &["apiVersion", "kind", "metadata"];

/// Standard object metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_fields: Vec<Value>,
}

impl ObjectMeta {
    fn field(
        &self,
        name: &str,
    ) -> Option<&dyn Navigable> {
        let field: &dyn Navigable = match resolve_field(META_FIELDS, name)? {
            "name" => &self.name,
            "namespace" => &self.namespace,
            "uid" => &self.uid,
            "resourceVersion" => &self.resource_version,
            "generation" => &self.generation,
            "creationTimestamp" => &self.creation_timestamp,
            "labels" => &self.labels,
            "annotations" => &self.annotations,
            "ownerReferences" => &self.owner_references,
            "finalizers" => &self.finalizers,
            "managedFields" => &self.managed_fields,
            _ => return None,
        };
        Some(field)
    }

    fn field_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut dyn Navigable> {
        let field: &mut dyn Navigable = match resolve_field(META_FIELDS, name)? {
            "name" => &mut self.name,
            "namespace" => &mut self.namespace,
            "uid" => &mut self.uid,
            "resourceVersion" => &mut self.resource_version,
            "generation" => &mut self.generation,
            "creationTimestamp" => &mut self.creation_timestamp,
            "labels" => &mut self.labels,
            "annotations" => &mut self.annotations,
            "ownerReferences" => &mut self.owner_references,
            "finalizers" => &mut self.finalizers,
            "managedFields" => &mut self.managed_fields,
            _ => return None,
        };
        Some(field)
    }
}

impl Navigable for ObjectMeta {
    fn shape(&self) -> Shape {
        Shape::Record
    }

    fn child(
        &self,
        segment: &Segment,
    ) -> Option<&dyn Navigable> {
        match segment {
            Segment::Field(name) => self.field(name),
            _ => None,
        }
    }

    fn child_mut(
        &mut self,
        segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        match segment {
            Segment::Field(name) => self.field_mut(name),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        META_FIELDS.iter().filter_map(|name| self.field(name)).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        vec![
            &mut self.name,
            &mut self.namespace,
            &mut self.uid,
            &mut self.resource_version,
            &mut self.generation,
            &mut self.creation_timestamp,
            &mut self.labels,
            &mut self.annotations,
            &mut self.owner_references,
            &mut self.finalizers,
            &mut self.managed_fields,
        ]
    }

    fn remove(
        &mut self,
        segment: &Segment,
    ) -> bool {
        match self.child_mut(segment) {
            Some(field) => {
                field.clear();
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        *self = ObjectMeta::default();
    }

    fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A resource of any kind: typed envelope plus an untyped body.
///
/// `apiVersion`, `kind` and `metadata` are record fields; everything else
/// (`spec`, `status`, `data`, ...) lives in the flattened `data` map and can
/// be removed outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicObject {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl DynamicObject {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        metadata: ObjectMeta,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata,
            data: Map::new(),
        }
    }

    pub fn with_data(
        mut self,
        field: impl Into<String>,
        value: Value,
    ) -> Self {
        self.data.insert(field.into(), value);
        self
    }
}

impl Navigable for DynamicObject {
    fn shape(&self) -> Shape {
        Shape::Record
    }

    fn child(
        &self,
        segment: &Segment,
    ) -> Option<&dyn Navigable> {
        let Segment::Field(name) = segment else {
            return None;
        };
        match resolve_field(OBJECT_FIELDS, name) {
            Some("apiVersion") => Some(&self.api_version),
            Some("kind") => Some(&self.kind),
            Some(_) => Some(&self.metadata),
            None => self.data.get(name).map(|v| v as &dyn Navigable),
        }
    }

    fn child_mut(
        &mut self,
        segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        let Segment::Field(name) = segment else {
            return None;
        };
        match resolve_field(OBJECT_FIELDS, name) {
            Some("apiVersion") => Some(&mut self.api_version),
            Some("kind") => Some(&mut self.kind),
            Some(_) => Some(&mut self.metadata),
            None => self.data.get_mut(name).map(|v| v as &mut dyn Navigable),
        }
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        let mut children: Vec<&dyn Navigable> = vec![&self.api_version, &self.kind, &self.metadata];
        children.extend(self.data.values().map(|v| v as &dyn Navigable));
        children
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        let mut children: Vec<&mut dyn Navigable> =
            vec![&mut self.api_version, &mut self.kind, &mut self.metadata];
        children.extend(self.data.values_mut().map(|v| v as &mut dyn Navigable));
        children
    }

    fn remove(
        &mut self,
        segment: &Segment,
    ) -> bool {
        let Segment::Field(name) = segment else {
            return false;
        };
        if resolve_field(OBJECT_FIELDS, name).is_some() {
            if let Some(field) = self.child_mut(segment) {
                field.clear();
                return true;
            }
            return false;
        }
        self.data.remove(name).is_some()
    }

    fn clear(&mut self) {
        *self = DynamicObject::default();
    }

    fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
