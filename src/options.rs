use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One character or a small set of characters playing the same role.
///
/// # Examples
/// ```
/// use csvtok::CharSet;
///
/// let quotes = CharSet::from("\"'");
/// assert!(quotes.contains('\''));
/// assert!(!quotes.contains(','));
/// assert!(CharSet::none().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CharSet {
    chars: SmallVec<[char; 4]>,
}

impl CharSet {
    /// A set matching nothing; disables the character class it configures.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(ch: char) -> Self {
        let mut chars = SmallVec::new();
        chars.push(ch);
        Self { chars }
    }

    #[inline]
    pub fn contains(&self, ch: char) -> bool {
        match self.chars.as_slice() {
            [] => false,
            [only] => *only == ch,
            many => many.contains(&ch),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// The first configured character, used when a single representative is needed.
    pub fn first(&self) -> Option<char> {
        self.chars.first().copied()
    }
}

impl From<char> for CharSet {
    fn from(ch: char) -> Self {
        Self::single(ch)
    }
}

impl From<&str> for CharSet {
    fn from(chars: &str) -> Self {
        chars.chars().collect()
    }
}

impl From<String> for CharSet {
    fn from(chars: String) -> Self {
        Self::from(chars.as_str())
    }
}

impl From<CharSet> for String {
    fn from(set: CharSet) -> Self {
        set.chars.into_iter().collect()
    }
}

impl FromIterator<char> for CharSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut chars: SmallVec<[char; 4]> = SmallVec::new();
        for ch in iter {
            if !chars.contains(&ch) {
                chars.push(ch);
            }
        }
        Self { chars }
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.chars {
            write!(f, "{}", ch.escape_default())?;
        }
        Ok(())
    }
}

/// Settings for one tokenizer instance. Fixed once the tokenizer is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub quote: CharSet,
    pub separator: CharSet,
    pub comment: CharSet,
    /// Drop whitespace around unquoted cells. Off by default: whitespace is
    /// significant unless trimmed.
    pub trim_whitespace: bool,
    /// Treat runs of separators as one separator.
    pub collapse_separators: bool,
    /// Only honor comment characters when the row has no content yet.
    pub comments_at_line_start: bool,
    /// Keep the current physical line around so errors can show it.
    pub collect_error_context: bool,
}

impl TokenizerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, quote: impl Into<CharSet>) -> Self {
        self.quote = quote.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<CharSet>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<CharSet>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_trim_whitespace(mut self, trim_whitespace: bool) -> Self {
        self.trim_whitespace = trim_whitespace;
        self
    }

    pub fn with_collapse_separators(mut self, collapse_separators: bool) -> Self {
        self.collapse_separators = collapse_separators;
        self
    }

    pub fn with_comments_at_line_start(mut self, comments_at_line_start: bool) -> Self {
        self.comments_at_line_start = comments_at_line_start;
        self
    }

    pub fn with_collect_error_context(mut self, collect_error_context: bool) -> Self {
        self.collect_error_context = collect_error_context;
        self
    }
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            quote: CharSet::single('"'),
            separator: CharSet::single(','),
            comment: CharSet::none(),
            trim_whitespace: false,
            collapse_separators: false,
            comments_at_line_start: true,
            collect_error_context: false,
        }
    }
}
