use crate::error::Location;

/// Diagnostic position of the driver.
///
/// `row` is 1-based. `column` is 0 at the start of a line and counts the
/// characters consumed on it. When error context is collected, `line` holds
/// the raw text of the current physical line.
#[derive(Debug)]
pub(crate) struct Cursor {
    row: u64,
    column: u64,
    offset: usize,
    line: Option<String>,
}

impl Cursor {
    pub(crate) fn new(collect_context: bool) -> Self {
        Self {
            row: 1,
            column: 0,
            offset: 0,
            line: collect_context.then(String::new),
        }
    }

    pub(crate) fn row(&self) -> u64 {
        self.row
    }

    pub(crate) fn column(&self) -> u64 {
        self.column
    }

    #[inline]
    pub(crate) fn advance(&mut self, ch: char, offset: usize) {
        self.column += 1;
        self.offset = offset;
        if let Some(line) = self.line.as_mut() {
            if ch != '\n' {
                line.push(ch);
            }
        }
    }

    /// Account for a run of characters skipped without classification.
    /// The run never contains a line break.
    pub(crate) fn advance_run(&mut self, run: &str, offset: usize) {
        let Some((last, _)) = run.char_indices().next_back() else {
            return;
        };
        self.column += run.chars().count() as u64;
        self.offset = offset + last;
        if let Some(line) = self.line.as_mut() {
            line.push_str(run);
        }
    }

    pub(crate) fn newline(&mut self) {
        self.row += 1;
        self.column = 0;
        if let Some(line) = self.line.as_mut() {
            line.clear();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.row = 1;
        self.column = 0;
    }

    pub(crate) fn location(&self) -> Location {
        Location {
            row: self.row,
            column: self.column,
            offset: self.offset,
        }
    }

    /// The current line with a caret under the current column.
    pub(crate) fn context(&self) -> String {
        let Some(line) = self.line.as_deref() else {
            return String::new();
        };
        if line.is_empty() && self.column == 0 {
            return String::new();
        }
        let mut out = String::with_capacity(line.len() * 2 + 2);
        out.extend(line.chars().map(|ch| if ch == '\r' { ' ' } else { ch }));
        out.push('\n');
        let lead = self.column.saturating_sub(1) as usize;
        // Keep tabs so the caret lines up in a terminal.
        out.extend(
            line.chars()
                .take(lead)
                .map(|ch| if ch == '\t' { '\t' } else { ' ' }),
        );
        out.push('^');
        out
    }
}
