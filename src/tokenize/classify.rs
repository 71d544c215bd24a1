use crate::error::ParseErrorKind;
use crate::TokenizerOptions;

/// Input classes driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Char,
    Whitespace,
    Quote,
    Separator,
    Newline,
    CarriageReturn,
    Comment,
}

/// Map a character to its event. First match wins, since the configured
/// classes may overlap.
///
/// While a quoted cell is open only `active_quote` counts as a quote.
/// `row_is_empty` is true when neither committed text nor pending
/// whitespace has been buffered for the current row.
#[inline]
pub(crate) fn classify(
    options: &TokenizerOptions,
    ch: char,
    active_quote: Option<char>,
    row_is_empty: bool,
) -> Result<Event, ParseErrorKind> {
    match ch {
        '\0' => return Err(ParseErrorKind::UnexpectedNul),
        '\r' => return Ok(Event::CarriageReturn),
        '\n' => return Ok(Event::Newline),
        _ => {}
    }
    let is_quote = match active_quote {
        Some(quote) => quote == ch,
        None => options.quote.contains(ch),
    };
    if is_quote {
        return Ok(Event::Quote);
    }
    if options.separator.contains(ch) {
        return Ok(Event::Separator);
    }
    if options.comment.contains(ch) && (!options.comments_at_line_start || row_is_empty) {
        return Ok(Event::Comment);
    }
    if ch == ' ' || ch == '\t' {
        return Ok(Event::Whitespace);
    }
    Ok(Event::Char)
}
