//! Streaming tokenizer: chunk driver over the state machine.

mod buffer;
mod classify;
mod cursor;
mod state;

use memchr::memchr2;

use crate::sink::RowSink;
use crate::{Error, Result, TokenizerOptions};

use buffer::RowBuffer;
use classify::{classify, Event};
use cursor::Cursor;
use state::{Context, State};

/// Splits delimiter-separated text into rows and cells.
///
/// Input arrives in chunks of any size; a chunk boundary may fall anywhere,
/// including inside a quoted cell or between a CR and its LF. Rows and cells
/// are delivered to the sink `S` as soon as they are complete.
///
/// The first error is sticky: every later call reports it again and the
/// tokenizer must be replaced to continue.
///
/// # Examples
/// ```
/// use csvtok::{RowCollector, Tokenizer, TokenizerOptions};
///
/// let options = TokenizerOptions::new().with_separator(';');
/// let mut tokenizer = Tokenizer::with_options(options, RowCollector::new());
/// tokenizer.process_chunk("a;\"b\n").unwrap();
/// tokenizer.process_chunk("c\";d").unwrap();
/// tokenizer.flush().unwrap();
///
/// let rows = tokenizer.into_sink().into_rows();
/// assert_eq!(rows[0].cells, vec!["a", "b\nc", "d"]);
/// ```
#[derive(Debug)]
pub struct Tokenizer<S> {
    options: TokenizerOptions,
    state: State,
    ctx: Context,
    buffer: RowBuffer,
    cursor: Cursor,
    sink: S,
}

impl<S: RowSink> Tokenizer<S> {
    pub fn new(sink: S) -> Self {
        Self::with_options(TokenizerOptions::default(), sink)
    }

    pub fn with_options(options: TokenizerOptions, sink: S) -> Self {
        let cursor = Cursor::new(options.collect_error_context);
        Self {
            options,
            state: State::default(),
            ctx: Context::default(),
            buffer: RowBuffer::default(),
            cursor,
            sink,
        }
    }

    /// Feed the next piece of input.
    ///
    /// Stops at the first offending character; the returned error carries
    /// its location, including its byte offset inside `chunk`.
    pub fn process_chunk(&mut self, chunk: &str) -> Result<()> {
        if let Some(err) = &self.ctx.error {
            return Err(err.clone());
        }
        let bytes = chunk.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            if self.state == State::ReadComment {
                let rest = &bytes[pos..];
                let skip = memchr2(b'\n', b'\0', rest).unwrap_or(rest.len());
                if skip > 0 {
                    self.cursor.advance_run(&chunk[pos..pos + skip], pos);
                    pos += skip;
                    continue;
                }
            }
            let Some(ch) = chunk[pos..].chars().next() else {
                break;
            };
            self.feed(ch, pos);
            if let Some(err) = &self.ctx.error {
                return Err(err.clone());
            }
            pos += ch.len_utf8();
        }
        Ok(())
    }

    /// Close the open row, if any, as though a newline had been read.
    /// Call once after the last chunk.
    ///
    /// An unterminated quoted cell is closed at end of input and a pending
    /// CR counts as a line end.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(err) = &self.ctx.error {
            return Err(err.clone());
        }
        tracing::trace!(state = ?self.state, row_open = self.buffer.is_open(), "flush");
        match self.state {
            State::ReadQuoted | State::ReadQuotedDosCR => {
                self.ctx.quote = None;
                self.state = State::ReadQuotedSkipPost;
            }
            State::ReadDosCR => {
                // Also when no row is open: a lone CR in Start still ends a line.
                self.state = self.ctx.resume;
                self.ctx.value = '\n';
                self.dispatch(Event::Newline);
            }
            State::ReadComment => self.state = State::Start,
            _ => {}
        }
        if self.buffer.is_open() {
            self.ctx.value = '\n';
            self.dispatch(Event::Newline);
        }
        match &self.ctx.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// [`Tokenizer::process_chunk`], or [`Tokenizer::flush`] for an empty chunk.
    pub fn process(&mut self, chunk: &str) -> Result<()> {
        if chunk.is_empty() {
            self.flush()
        } else {
            self.process_chunk(chunk)
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.ctx.error.as_ref()
    }

    /// The line being read with a caret under the current column. Empty
    /// unless error context collection is enabled.
    pub fn error_context(&self) -> String {
        self.cursor.context()
    }

    pub fn current_row(&self) -> u64 {
        self.cursor.row()
    }

    pub fn current_column(&self) -> u64 {
        self.cursor.column()
    }

    /// Restart row/column numbering. Parser state is untouched.
    pub fn reset_cursor_location(&mut self) {
        self.cursor.reset();
    }

    /// True between the first character of a row and its end.
    pub fn is_row_open(&self) -> bool {
        self.buffer.is_open()
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn feed(&mut self, ch: char, offset: usize) {
        if self.state == State::ReadError {
            self.dispatch(Event::Char);
            return;
        }
        self.cursor.advance(ch, offset);
        self.ctx.value = ch;
        match classify(
            &self.options,
            ch,
            self.ctx.quote,
            !self.buffer.has_content(),
        ) {
            Ok(Event::Newline) => {
                self.dispatch(Event::Newline);
                if self.state != State::ReadError {
                    self.cursor.newline();
                }
            }
            Ok(event) => self.dispatch(event),
            Err(kind) => {
                let err = Error::parse(kind, self.cursor.location());
                self.enter_error(err);
            }
        }
    }
}
