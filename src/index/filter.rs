use crate::FieldPath;
use crate::IndexError;
use crate::Navigable;
use crate::PathError;
use crate::Segment;
use crate::Shape;

/// Strips configured fields from a resource in place.
///
/// Missing intermediate fields make a pattern a no-op. The final segment is
/// removed from maps and sequences and zeroed on records.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    paths: Vec<FieldPath>,
}

impl FieldFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, IndexError> {
        let paths = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                FieldPath::parse(pattern).map_err(|source| IndexError::InvalidExpression {
                    expression: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn apply(
        &self,
        resource: &mut dyn Navigable,
    ) -> Result<(), IndexError> {
        for path in &self.paths {
            strip(resource, path.segments()).map_err(|source| IndexError::Filter {
                pattern: path.expression().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

fn strip(
    node: &mut dyn Navigable,
    segments: &[Segment],
) -> Result<(), PathError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(());
    };
    if node.is_null() {
        return Ok(());
    }
    if node.shape() == Shape::Scalar {
        return Err(PathError::NotNavigable {
            segment: segment.to_string(),
        });
    }

    if rest.is_empty() {
        match segment {
            Segment::Wildcard => node.clear(),
            _ => {
                node.remove(segment);
            }
        }
        return Ok(());
    }

    match segment {
        Segment::Wildcard => {
            for child in node.children_mut() {
                strip(child, rest)?;
            }
            Ok(())
        }
        _ => match node.child_mut(segment) {
            Some(child) => strip(child, rest),
            None => Ok(()),
        },
    }
}
