use tracing::trace;

use super::FieldFilter;
use super::KeyExtractor;
use crate::Error;
use crate::IndexError;
use crate::IndexKey;
use crate::Navigable;
use crate::Result;

/// Turns a resource into its index key: strip ignored fields, then evaluate
/// each index-by expression in order.
#[derive(Debug, Clone)]
pub struct Indexer {
    filter: FieldFilter,
    extractors: Vec<KeyExtractor>,
}

impl Indexer {
    /// Every expression is validated here.
    ///
    /// An ignore pattern that overlaps an index-by path would strip the value
    /// before it is read, so such a configuration is rejected.
    pub fn new<S, T>(
        index_by: &[S],
        ignore_fields: &[T],
    ) -> Result<Self>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if index_by.is_empty() {
            return Err(IndexError::NoIndexExpressions.into());
        }
        let extractors = index_by
            .iter()
            .map(|expression| KeyExtractor::new(expression.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let filter = FieldFilter::new(ignore_fields)?;

        for pattern in filter.paths() {
            if let Some(extractor) = extractors.iter().find(|e| pattern.overlaps(e.path())) {
                return Err(Error::InvalidConfig(format!(
                    "ignore field `{}` overlaps index expression `{}`",
                    pattern,
                    extractor.expression()
                )));
            }
        }

        Ok(Self { filter, extractors })
    }

    pub fn num_keys(&self) -> usize {
        self.extractors.len()
    }

    pub fn filter(&self) -> &FieldFilter {
        &self.filter
    }

    /// Filters the resource in place, then extracts its key.
    pub fn process(
        &self,
        resource: &mut dyn Navigable,
    ) -> std::result::Result<IndexKey, IndexError> {
        self.filter.apply(resource)?;
        self.extract(resource)
    }

    /// Extracts the key without filtering.
    pub fn extract(
        &self,
        resource: &dyn Navigable,
    ) -> std::result::Result<IndexKey, IndexError> {
        let parts = self
            .extractors
            .iter()
            .map(|extractor| extractor.evaluate(resource))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let key = IndexKey::new(parts);
        trace!(%key, "extracted index key");
        Ok(key)
    }
}
