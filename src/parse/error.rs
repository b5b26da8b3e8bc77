use thiserror::Error;

/// A `.logic` source that could not be parsed, with the position where the
/// grammar gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {reason}")]
pub struct ParseError {
    offset: usize,
    line: usize,
    column: usize,
    reason: String,
}

impl ParseError {
    /// Locate byte `offset` of `source` as a 1-based line and column.
    pub(crate) fn at(source: &str, offset: usize, reason: impl Into<String>) -> Self {
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;

        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            "unexpected input".to_owned()
        } else {
            reason
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("; ")
        };

        Self {
            offset,
            line,
            column,
            reason,
        }
    }

    /// Byte offset into the source.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
