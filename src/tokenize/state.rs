//! The transition table.
//!
//! One handler per state, each matching exhaustively on the event. A handler
//! returns the next state or the error that sends the tokenizer to
//! [`State::ReadError`].

use super::classify::Event;
use super::Tokenizer;
use crate::error::ParseErrorKind;
use crate::sink::RowSink;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum State {
    /// No row open.
    #[default]
    Start,
    /// Row open, before the content of a cell.
    ReadSkipPre,
    ReadQuoted,
    /// Saw the active quote inside a quoted cell: escaped quote or end of quote.
    ReadQuotedCheckEscape,
    /// Quote closed; only whitespace until the next terminator.
    ReadQuotedSkipPost,
    /// Saw a CR outside quotes, a LF must follow.
    ReadDosCR,
    /// Saw a CR inside quotes, a LF must follow.
    ReadQuotedDosCR,
    ReadUnquoted,
    /// Blanks inside or after an unquoted cell.
    ReadUnquotedWhitespace,
    ReadComment,
    /// Sticky until the tokenizer is replaced.
    ReadError,
}

/// Working memory of the state machine.
#[derive(Debug)]
pub(crate) struct Context {
    /// Character being dispatched.
    pub(crate) value: char,
    /// Quote character that opened the current quoted cell.
    pub(crate) quote: Option<char>,
    /// Physical line where the open row started.
    pub(crate) first_row: u64,
    /// State whose newline handling a pending CR defers to.
    pub(crate) resume: State,
    pub(crate) error: Option<Error>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            value: '\0',
            quote: None,
            first_row: 1,
            resume: State::Start,
            error: None,
        }
    }
}

impl<S: RowSink> Tokenizer<S> {
    pub(crate) fn dispatch(&mut self, event: Event) {
        match self.transition(self.state, event) {
            Ok(next) => self.state = next,
            Err(err) => self.enter_error(err),
        }
    }

    pub(crate) fn enter_error(&mut self, err: Error) {
        tracing::debug!(
            error = %err,
            row = self.cursor.row(),
            column = self.cursor.column(),
            "tokenizer entered error state"
        );
        self.ctx.error = Some(err);
        self.state = State::ReadError;
    }

    fn transition(&mut self, state: State, event: Event) -> Result<State> {
        match state {
            State::Start => self.start(event),
            State::ReadSkipPre => self.skip_pre(event),
            State::ReadQuoted => Ok(self.quoted(event)),
            State::ReadQuotedCheckEscape => self.quoted_check_escape(event),
            State::ReadQuotedSkipPost => self.quoted_skip_post(event),
            State::ReadDosCR => self.dos_cr(event),
            State::ReadQuotedDosCR => self.quoted_dos_cr(event),
            State::ReadUnquoted => self.unquoted(event),
            State::ReadUnquotedWhitespace => self.unquoted_whitespace(event),
            State::ReadComment => Ok(self.comment(event)),
            State::ReadError => Ok(self.sticky_error()),
        }
    }

    fn start(&mut self, event: Event) -> Result<State> {
        let value = self.ctx.value;
        match event {
            Event::Char => {
                self.open_row();
                self.buffer.push(value);
                Ok(State::ReadUnquoted)
            }
            Event::Whitespace => {
                self.open_row();
                if !self.options.trim_whitespace {
                    self.buffer.push_whitespace(value);
                }
                Ok(State::ReadSkipPre)
            }
            Event::Quote => {
                self.open_row();
                self.ctx.quote = Some(value);
                Ok(State::ReadQuoted)
            }
            Event::Separator => {
                self.open_row();
                if !self.options.collapse_separators {
                    self.close_cell()?;
                }
                Ok(State::ReadSkipPre)
            }
            Event::Newline => {
                self.open_row();
                self.close_row()?;
                Ok(State::Start)
            }
            Event::CarriageReturn => Ok(self.await_lf(State::Start)),
            Event::Comment => Ok(State::ReadComment),
        }
    }

    fn skip_pre(&mut self, event: Event) -> Result<State> {
        let value = self.ctx.value;
        match event {
            Event::Char => {
                self.buffer.commit_whitespace();
                self.buffer.push(value);
                Ok(State::ReadUnquoted)
            }
            Event::Whitespace => {
                if !self.options.trim_whitespace {
                    self.buffer.push_whitespace(value);
                }
                Ok(State::ReadSkipPre)
            }
            Event::Quote => {
                self.buffer.discard_whitespace();
                self.ctx.quote = Some(value);
                Ok(State::ReadQuoted)
            }
            Event::Separator => {
                self.buffer.discard_whitespace();
                if !self.options.collapse_separators {
                    self.close_cell()?;
                }
                Ok(State::ReadSkipPre)
            }
            Event::Newline => {
                self.buffer.discard_whitespace();
                self.close_cell()?;
                self.close_row()?;
                Ok(State::Start)
            }
            Event::CarriageReturn => Ok(self.await_lf(State::ReadSkipPre)),
            Event::Comment => {
                self.buffer.discard_whitespace();
                if self.buffer.completed_cells() == 0 {
                    tracing::trace!(row = self.ctx.first_row, "row abandoned at comment");
                    self.buffer.abandon();
                } else {
                    self.close_cell()?;
                    self.close_row()?;
                }
                Ok(State::ReadComment)
            }
        }
    }

    fn quoted(&mut self, event: Event) -> State {
        match event {
            Event::Quote => State::ReadQuotedCheckEscape,
            Event::CarriageReturn => State::ReadQuotedDosCR,
            Event::Newline => {
                self.buffer.push('\n');
                State::ReadQuoted
            }
            Event::Char | Event::Whitespace | Event::Separator | Event::Comment => {
                self.buffer.push(self.ctx.value);
                State::ReadQuoted
            }
        }
    }

    fn quoted_check_escape(&mut self, event: Event) -> Result<State> {
        match event {
            Event::Quote => {
                self.buffer.push(self.ctx.value);
                Ok(State::ReadQuoted)
            }
            Event::Whitespace => {
                self.ctx.quote = None;
                Ok(State::ReadQuotedSkipPost)
            }
            Event::Char => Err(self.fail(ParseErrorKind::CharAfterPossibleEndQuote)),
            Event::Separator | Event::Newline | Event::CarriageReturn | Event::Comment => {
                self.ctx.quote = None;
                self.quoted_skip_post(event)
            }
        }
    }

    fn quoted_skip_post(&mut self, event: Event) -> Result<State> {
        match event {
            Event::Whitespace => Ok(State::ReadQuotedSkipPost),
            Event::Separator => {
                self.close_cell()?;
                Ok(State::ReadSkipPre)
            }
            Event::Newline => {
                self.close_cell()?;
                self.close_row()?;
                Ok(State::Start)
            }
            Event::CarriageReturn => Ok(self.await_lf(State::ReadQuotedSkipPost)),
            Event::Comment => {
                self.close_cell()?;
                self.close_row()?;
                Ok(State::ReadComment)
            }
            Event::Char => Err(self.fail(ParseErrorKind::CharAfterEndQuote)),
            Event::Quote => Err(self.fail(ParseErrorKind::QuoteAfterEndQuote)),
        }
    }

    fn dos_cr(&mut self, event: Event) -> Result<State> {
        let kind = match event {
            Event::Newline => return self.transition(self.ctx.resume, Event::Newline),
            Event::Quote => ParseErrorKind::QuoteAfterCr,
            Event::Separator => ParseErrorKind::SeparatorAfterCr,
            Event::CarriageReturn => ParseErrorKind::CrAfterCr,
            Event::Whitespace => ParseErrorKind::WhitespaceAfterCr,
            Event::Char => ParseErrorKind::CharAfterCr,
            Event::Comment => ParseErrorKind::CommentAfterCr,
        };
        Err(self.fail(kind))
    }

    fn quoted_dos_cr(&mut self, event: Event) -> Result<State> {
        let kind = match event {
            Event::Newline => {
                self.buffer.push('\n');
                return Ok(State::ReadQuoted);
            }
            Event::Quote => ParseErrorKind::QuoteAfterCr,
            Event::Separator => ParseErrorKind::SeparatorAfterCr,
            Event::CarriageReturn => ParseErrorKind::CrAfterCr,
            Event::Whitespace => ParseErrorKind::WhitespaceAfterCr,
            Event::Char => ParseErrorKind::CharAfterCr,
            Event::Comment => ParseErrorKind::CommentAfterCr,
        };
        Err(self.fail(kind))
    }

    fn unquoted(&mut self, event: Event) -> Result<State> {
        match event {
            // Stray quotes inside an unquoted cell are kept as text.
            Event::Char | Event::Quote => {
                self.buffer.push(self.ctx.value);
                Ok(State::ReadUnquoted)
            }
            Event::Whitespace => {
                self.buffer.push_whitespace(self.ctx.value);
                Ok(State::ReadUnquotedWhitespace)
            }
            Event::Separator => {
                self.close_cell()?;
                Ok(State::ReadSkipPre)
            }
            Event::Newline => {
                self.close_cell()?;
                self.close_row()?;
                Ok(State::Start)
            }
            Event::CarriageReturn => Ok(self.await_lf(State::ReadUnquoted)),
            Event::Comment => {
                self.close_cell()?;
                self.close_row()?;
                Ok(State::ReadComment)
            }
        }
    }

    fn unquoted_whitespace(&mut self, event: Event) -> Result<State> {
        match event {
            Event::Char | Event::Quote => {
                self.buffer.commit_whitespace();
                self.buffer.push(self.ctx.value);
                Ok(State::ReadUnquoted)
            }
            Event::Whitespace => {
                self.buffer.push_whitespace(self.ctx.value);
                Ok(State::ReadUnquotedWhitespace)
            }
            Event::Separator => {
                self.settle_trailing_whitespace();
                self.close_cell()?;
                Ok(State::ReadSkipPre)
            }
            Event::Newline => {
                self.settle_trailing_whitespace();
                self.close_cell()?;
                self.close_row()?;
                Ok(State::Start)
            }
            Event::CarriageReturn => Ok(self.await_lf(State::ReadUnquotedWhitespace)),
            Event::Comment => {
                self.settle_trailing_whitespace();
                self.close_cell()?;
                self.close_row()?;
                Ok(State::ReadComment)
            }
        }
    }

    fn comment(&mut self, event: Event) -> State {
        match event {
            Event::Newline => State::Start,
            _ => State::ReadComment,
        }
    }

    fn sticky_error(&mut self) -> State {
        debug_assert!(self.ctx.error.is_some(), "error state without an error");
        State::ReadError
    }

    fn open_row(&mut self) {
        self.buffer.open();
        self.ctx.first_row = self.cursor.row();
    }

    fn close_cell(&mut self) -> Result<()> {
        self.buffer.next_cell(&mut self.sink)
    }

    fn close_row(&mut self) -> Result<()> {
        self.buffer.end_row(&mut self.sink, self.ctx.first_row)
    }

    fn await_lf(&mut self, resume: State) -> State {
        self.ctx.resume = resume;
        State::ReadDosCR
    }

    fn settle_trailing_whitespace(&mut self) {
        if self.options.trim_whitespace {
            self.buffer.discard_whitespace();
        } else {
            self.buffer.commit_whitespace();
        }
    }

    fn fail(&self, kind: ParseErrorKind) -> Error {
        Error::parse(kind, self.cursor.location())
    }
}
