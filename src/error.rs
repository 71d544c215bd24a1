use std::fmt;

/// Data-format errors detected while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected NUL")]
    UnexpectedNul,
    #[error("quote after CR")]
    QuoteAfterCr,
    #[error("sep after CR")]
    SeparatorAfterCr,
    #[error("CR after CR")]
    CrAfterCr,
    #[error("whitespace after CR")]
    WhitespaceAfterCr,
    #[error("char after CR")]
    CharAfterCr,
    #[error("comment after CR")]
    CommentAfterCr,
    #[error("char after possible endquote")]
    CharAfterPossibleEndQuote,
    #[error("char after endquote")]
    CharAfterEndQuote,
    #[error("quote after endquote")]
    QuoteAfterEndQuote,
}

/// Position of the character that caused an error.
///
/// `row` is 1-based, `column` counts characters on the physical line up to
/// and including the failing one, and `offset` is the byte offset of that
/// character inside the chunk that was being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub row: u64,
    pub column: u64,
    pub offset: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column {}", self.row, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{kind} at {location}")]
    Parse {
        kind: ParseErrorKind,
        location: Location,
    },
    #[error("no callable for {0}")]
    NoCallable(&'static str),
    #[error("sink rejected row: {0}")]
    Sink(String),
    #[error("read failed: {0}")]
    Io(String),
    #[error("invalid utf-8 at byte {offset}")]
    InvalidUtf8 { offset: u64 },
}

impl Error {
    pub fn parse(kind: ParseErrorKind, location: Location) -> Self {
        Error::Parse { kind, location }
    }

    pub fn sink(message: impl Into<String>) -> Self {
        Error::Sink(message.into())
    }

    /// The data-format error kind, if this is a parse error.
    pub fn kind(&self) -> Option<ParseErrorKind> {
        match self {
            Error::Parse { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Parse { location, .. } => Some(*location),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_parse_error_display() {
        let err = Error::parse(
            ParseErrorKind::CharAfterCr,
            Location {
                row: 3,
                column: 7,
                offset: 40,
            },
        );
        assert_eq!(err.to_string(), "char after CR at row 3, column 7");
        assert_eq!(err.kind(), Some(ParseErrorKind::CharAfterCr));
        assert_eq!(err.location().map(|loc| loc.offset), Some(40));
    }

    #[rstest::rstest]
    fn test_non_parse_errors_have_no_kind() {
        let err = Error::NoCallable("cell");
        assert_eq!(err.to_string(), "no callable for cell");
        assert_eq!(err.kind(), None);
        assert_eq!(err.location(), None);
    }
}
