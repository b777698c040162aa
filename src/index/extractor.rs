use crate::FieldPath;
use crate::IndexError;
use crate::Navigable;

/// Evaluates one index-by expression against a resource.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    path: FieldPath,
}

impl KeyExtractor {
    /// Fails if the expression does not parse; evaluation never reports
    /// syntax errors.
    pub fn new(expression: &str) -> Result<Self, IndexError> {
        let path = FieldPath::parse(expression).map_err(|source| IndexError::InvalidExpression {
            expression: expression.to_string(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn expression(&self) -> &str {
        self.path.expression()
    }

    /// Renders the first match. A key is required, so no match is an error.
    pub fn evaluate(
        &self,
        resource: &dyn Navigable,
    ) -> Result<String, IndexError> {
        self.path
            .evaluate(resource)
            .first()
            .map(|node| node.render())
            .ok_or_else(|| IndexError::NoMatch {
                expression: self.expression().to_string(),
            })
    }
}
