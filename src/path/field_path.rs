use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use std::str::FromStr;

use super::Segment;
use crate::Navigable;
use crate::PathError;

/// A parsed field-path expression.
///
/// Accepted forms: `metadata.name`, `.metadata.name`, `$.metadata.name`,
/// `{.metadata.name}`, `metadata.labels['app.kubernetes.io/name']`,
/// `spec.containers[0].image`, `spec.containers[*].image`,
/// `metadata.annotations.*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    expression: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(expression: &str) -> Result<Self, PathError> {
        let body = strip_wrappers(expression)?;
        let parser = Parser {
            expression,
            end: body.len(),
            chars: body.char_indices().peekable(),
        };
        let segments = parser.parse()?;
        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns every node the path addresses, in document order.
    ///
    /// Absent fields and paths running into scalars simply yield fewer
    /// matches. A null leaf is still a match.
    pub fn evaluate<'a>(
        &self,
        root: &'a dyn Navigable,
    ) -> Vec<&'a dyn Navigable> {
        let mut current = vec![root];
        for segment in &self.segments {
            let mut next = Vec::with_capacity(current.len());
            for node in current {
                match segment {
                    Segment::Wildcard => next.extend(node.children()),
                    _ => next.extend(node.child(segment)),
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// Whether one path is a segment-wise prefix of the other, so that
    /// stripping one would disturb the value addressed by the other.
    pub fn overlaps(
        &self,
        other: &FieldPath,
    ) -> bool {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a.matches(b))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn strip_wrappers(expression: &str) -> Result<&str, PathError> {
    let mut body = expression.trim();
    if let Some(inner) = body.strip_prefix('{') {
        body = inner
            .strip_suffix('}')
            .ok_or_else(|| PathError::Unterminated {
                expression: expression.to_string(),
            })?
            .trim();
    }
    body = body.strip_prefix('$').unwrap_or(body);
    body = body.strip_prefix('.').unwrap_or(body);
    if body.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(body)
}

struct Parser<'a> {
    expression: &'a str,
    end: usize,
    chars: Peekable<CharIndices<'a>>,
}

impl Parser<'_> {
    fn parse(mut self) -> Result<Vec<Segment>, PathError> {
        let mut segments = Vec::new();
        loop {
            let segment = match self.chars.peek().copied() {
                Some((_, '[')) => self.bracket()?,
                Some((offset, '.')) => return Err(self.empty_segment(offset)),
                Some(_) => self.name()?,
                None => return Err(self.empty_segment(self.end)),
            };
            segments.push(segment);

            match self.chars.peek().copied() {
                None => return Ok(segments),
                Some((_, '[')) => {}
                Some((_, '.')) => {
                    self.chars.next();
                    if let Some((offset, '[')) = self.chars.peek().copied() {
                        return Err(self.empty_segment(offset));
                    }
                }
                Some((offset, found)) => return Err(self.unexpected(offset, found)),
            }
        }
    }

    fn name(&mut self) -> Result<Segment, PathError> {
        let mut name = String::new();
        while let Some((offset, c)) = self.chars.peek().copied() {
            match c {
                '.' | '[' => break,
                ']' | '\'' | '"' => return Err(self.unexpected(offset, c)),
                c if c.is_whitespace() => return Err(self.unexpected(offset, c)),
                _ => {
                    name.push(c);
                    self.chars.next();
                }
            }
        }
        if name == "*" {
            Ok(Segment::Wildcard)
        } else {
            Ok(Segment::Field(name))
        }
    }

    fn bracket(&mut self) -> Result<Segment, PathError> {
        self.chars.next();
        self.skip_whitespace();
        let segment = match self.chars.peek().copied() {
            Some((_, quote @ ('\'' | '"'))) => {
                self.chars.next();
                Segment::Field(self.quoted(quote)?)
            }
            Some(_) => self.selector()?,
            None => return Err(self.unterminated()),
        };
        self.skip_whitespace();
        match self.chars.next() {
            Some((_, ']')) => Ok(segment),
            Some((offset, found)) => Err(self.unexpected(offset, found)),
            None => Err(self.unterminated()),
        }
    }

    fn quoted(
        &mut self,
        quote: char,
    ) -> Result<String, PathError> {
        let mut key = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(key),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, escaped)) => key.push(escaped),
                    None => return Err(self.unterminated()),
                },
                Some((_, c)) => key.push(c),
                None => return Err(self.unterminated()),
            }
        }
    }

    fn selector(&mut self) -> Result<Segment, PathError> {
        let mut raw = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if c == ']' {
                break;
            }
            raw.push(c);
            self.chars.next();
        }
        if self.chars.peek().is_none() {
            return Err(self.unterminated());
        }

        let selector = raw.trim();
        if selector == "*" {
            return Ok(Segment::Wildcard);
        }
        selector
            .parse::<usize>()
            .map(Segment::Index)
            .map_err(|_| PathError::InvalidSelector {
                expression: self.expression.to_string(),
                selector: selector.to_string(),
            })
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn empty_segment(
        &self,
        offset: usize,
    ) -> PathError {
        PathError::EmptySegment {
            expression: self.expression.to_string(),
            offset,
        }
    }

    fn unexpected(
        &self,
        offset: usize,
        found: char,
    ) -> PathError {
        PathError::UnexpectedChar {
            expression: self.expression.to_string(),
            offset,
            found,
        }
    }

    fn unterminated(&self) -> PathError {
        PathError::Unterminated {
            expression: self.expression.to_string(),
        }
    }
}
