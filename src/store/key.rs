use std::fmt;

/// Composite index key: one rendered part per index-by expression, in
/// configuration order.
///
/// Parts are compared element-wise, so a part containing `/` can never be
/// confused with two parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(Vec<String>);

impl IndexKey {
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element-wise prefix match. The empty key is a prefix of every key.
    pub fn starts_with(
        &self,
        prefix: &IndexKey,
    ) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for IndexKey {
    fn from(parts: [S; N]) -> Self {
        Self(parts.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for IndexKey {
    fn from(parts: Vec<String>) -> Self {
        Self(parts)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}
