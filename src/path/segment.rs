use std::fmt;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named field or map key
    Field(String),
    /// Sequence index
    Index(usize),
    /// Every child of the current node
    Wildcard,
}

impl Segment {
    /// Whether two segments can address the same node. Wildcards match
    /// anything, field names compare case-insensitively since record fields
    /// resolve that way.
    pub fn matches(
        &self,
        other: &Segment,
    ) -> bool {
        match (self, other) {
            (Segment::Wildcard, _) | (_, Segment::Wildcard) => true,
            (Segment::Field(a), Segment::Field(b)) => a.eq_ignore_ascii_case(b),
            (Segment::Index(a), Segment::Index(b)) => a == b,
            _ => false,
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for Segment {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Segment::Field(name) if is_plain_name(name) => f.write_str(name),
            Segment::Field(name) => write!(f, "['{}']", name.replace('\'', "\\'")),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Wildcard => f.write_str("*"),
        }
    }
}
