//! Shape-agnostic navigation over resource bodies.
//!
//! Field filtering and key extraction only ever talk to a resource through
//! [`Navigable`], so the same path expression works on a raw JSON document,
//! on a typed record, or on a mix of both (a record holding JSON maps).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::Segment;

/// Structural category of a navigable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Key-value container; children can be removed.
    Map,
    /// Fixed-shape record; children can only be zeroed.
    Record,
    /// Ordered sequence addressed by index.
    Sequence,
    /// Leaf value.
    Scalar,
}

pub trait Navigable: Send + Sync {
    fn shape(&self) -> Shape;

    /// Null / absent pointer-like value. Navigation through it is a no-op.
    fn is_null(&self) -> bool {
        false
    }

    fn child(
        &self,
        _segment: &Segment,
    ) -> Option<&dyn Navigable> {
        None
    }

    fn child_mut(
        &mut self,
        _segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        None
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        Vec::new()
    }

    /// Removes the addressed child. Maps drop the key, records zero the
    /// field in place, sequences drop the element.
    ///
    /// Returns false if nothing was addressed.
    fn remove(
        &mut self,
        _segment: &Segment,
    ) -> bool {
        false
    }

    /// Resets the node to its zero value in place.
    fn clear(&mut self);

    /// Canonical string form used for index keys.
    fn render(&self) -> String;
}

/// Resolves `name` against the declared fields of a record: exact match
/// first, then ASCII case-insensitive.
pub fn resolve_field(
    fields: &'static [&'static str],
    name: &str,
) -> Option<&'static str> {
    fields
        .iter()
        .copied()
        .find(|field| *field == name)
        .or_else(|| fields.iter().copied().find(|field| field.eq_ignore_ascii_case(name)))
}

impl Navigable for Value {
    fn shape(&self) -> Shape {
        match self {
            Value::Object(_) => Shape::Map,
            Value::Array(_) => Shape::Sequence,
            _ => Shape::Scalar,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn child(
        &self,
        segment: &Segment,
    ) -> Option<&dyn Navigable> {
        match (self, segment) {
            (Value::Object(map), Segment::Field(name)) => map.get(name).map(|v| v as &dyn Navigable),
            (Value::Array(items), Segment::Index(i)) => items.get(*i).map(|v| v as &dyn Navigable),
            _ => None,
        }
    }

    fn child_mut(
        &mut self,
        segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        match (self, segment) {
            (Value::Object(map), Segment::Field(name)) => map.get_mut(name).map(|v| v as &mut dyn Navigable),
            (Value::Array(items), Segment::Index(i)) => items.get_mut(*i).map(|v| v as &mut dyn Navigable),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        match self {
            Value::Object(map) => map.values().map(|v| v as &dyn Navigable).collect(),
            Value::Array(items) => items.iter().map(|v| v as &dyn Navigable).collect(),
            _ => Vec::new(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        match self {
            Value::Object(map) => map.values_mut().map(|v| v as &mut dyn Navigable).collect(),
            Value::Array(items) => items.iter_mut().map(|v| v as &mut dyn Navigable).collect(),
            _ => Vec::new(),
        }
    }

    fn remove(
        &mut self,
        segment: &Segment,
    ) -> bool {
        match (self, segment) {
            (Value::Object(map), Segment::Field(name)) => map.remove(name).is_some(),
            (Value::Array(items), Segment::Index(i)) if *i < items.len() => {
                items.remove(*i);
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self) {
        match self {
            Value::Object(map) => map.clear(),
            Value::Array(items) => items.clear(),
            Value::String(s) => s.clear(),
            Value::Number(n) => *n = 0.into(),
            Value::Bool(b) => *b = false,
            Value::Null => {}
        }
    }

    fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            composite => composite.to_string(),
        }
    }
}

impl Navigable for String {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn clear(&mut self) {
        String::clear(self)
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl Navigable for i64 {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn clear(&mut self) {
        *self = 0;
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl Navigable for bool {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn clear(&mut self) {
        *self = false;
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl<T: Navigable> Navigable for Option<T> {
    fn shape(&self) -> Shape {
        self.as_ref().map_or(Shape::Scalar, Navigable::shape)
    }

    fn is_null(&self) -> bool {
        self.as_ref().map_or(true, Navigable::is_null)
    }

    fn child(
        &self,
        segment: &Segment,
    ) -> Option<&dyn Navigable> {
        self.as_ref()?.child(segment)
    }

    fn child_mut(
        &mut self,
        segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        self.as_mut()?.child_mut(segment)
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        self.as_ref().map(Navigable::children).unwrap_or_default()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        self.as_mut().map(Navigable::children_mut).unwrap_or_default()
    }

    fn remove(
        &mut self,
        segment: &Segment,
    ) -> bool {
        self.as_mut().is_some_and(|inner| inner.remove(segment))
    }

    fn clear(&mut self) {
        *self = None;
    }

    fn render(&self) -> String {
        self.as_ref().map(Navigable::render).unwrap_or_default()
    }
}

impl Navigable for BTreeMap<String, String> {
    fn shape(&self) -> Shape {
        Shape::Map
    }

    fn child(
        &self,
        segment: &Segment,
    ) -> Option<&dyn Navigable> {
        match segment {
            Segment::Field(name) => self.get(name).map(|v| v as &dyn Navigable),
            _ => None,
        }
    }

    fn child_mut(
        &mut self,
        segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        match segment {
            Segment::Field(name) => self.get_mut(name).map(|v| v as &mut dyn Navigable),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        self.values().map(|v| v as &dyn Navigable).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        self.values_mut().map(|v| v as &mut dyn Navigable).collect()
    }

    fn remove(
        &mut self,
        segment: &Segment,
    ) -> bool {
        match segment {
            Segment::Field(name) => BTreeMap::remove(self, name).is_some(),
            _ => false,
        }
    }

    fn clear(&mut self) {
        BTreeMap::clear(self)
    }

    fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Navigable for Vec<Value> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn child(
        &self,
        segment: &Segment,
    ) -> Option<&dyn Navigable> {
        match segment {
            Segment::Index(i) => self.get(*i).map(|v| v as &dyn Navigable),
            _ => None,
        }
    }

    fn child_mut(
        &mut self,
        segment: &Segment,
    ) -> Option<&mut dyn Navigable> {
        match segment {
            Segment::Index(i) => self.get_mut(*i).map(|v| v as &mut dyn Navigable),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&dyn Navigable> {
        self.iter().map(|v| v as &dyn Navigable).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Navigable> {
        self.iter_mut().map(|v| v as &mut dyn Navigable).collect()
    }

    fn remove(
        &mut self,
        segment: &Segment,
    ) -> bool {
        match segment {
            Segment::Index(i) if *i < self.len() => {
                Vec::remove(self, *i);
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self) {
        Vec::clear(self)
    }

    fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
