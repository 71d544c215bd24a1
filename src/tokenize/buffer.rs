use crate::sink::{RowSink, RowView, SinkShape};
use crate::Result;

/// Text of the row being built.
///
/// `text` holds every cell of the row back to back and `offsets` marks the
/// boundaries: `offsets[0] == 0`, one more entry per completed cell, the
/// last one always `<= text.len()`. The row is open while `offsets` is
/// non-empty. `whitespace` holds blanks whose fate is decided by the next
/// event. All three are cleared, not dropped, when a row ends.
#[derive(Debug, Default)]
pub(crate) struct RowBuffer {
    text: String,
    offsets: Vec<usize>,
    whitespace: String,
    announced: bool,
}

impl RowBuffer {
    pub(crate) fn is_open(&self) -> bool {
        !self.offsets.is_empty()
    }

    pub(crate) fn has_content(&self) -> bool {
        !self.text.is_empty() || !self.whitespace.is_empty()
    }

    pub(crate) fn completed_cells(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub(crate) fn open(&mut self) {
        debug_assert!(!self.is_open(), "row opened twice");
        self.offsets.push(0);
        self.announced = false;
    }

    #[inline]
    pub(crate) fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    #[inline]
    pub(crate) fn push_whitespace(&mut self, ch: char) {
        self.whitespace.push(ch);
    }

    pub(crate) fn commit_whitespace(&mut self) {
        self.text.push_str(&self.whitespace);
        self.whitespace.clear();
    }

    pub(crate) fn discard_whitespace(&mut self) {
        self.whitespace.clear();
    }

    /// Close the current cell at the end of the committed text.
    pub(crate) fn next_cell<S: RowSink>(&mut self, sink: &mut S) -> Result<()> {
        debug_assert!(self.is_open(), "cell emitted with no open row");
        let start = self.offsets.last().copied().unwrap_or(0);
        let end = self.text.len();
        self.offsets.push(end);
        self.whitespace.clear();
        if sink.shape() == SinkShape::PerCell {
            self.announce(sink)?;
            let cell = if end > start {
                Some(&mut self.text[start..end])
            } else {
                None
            };
            sink.cell(cell)?;
        }
        Ok(())
    }

    /// Hand the finished row to the sink and reset for the next one.
    pub(crate) fn end_row<S: RowSink>(&mut self, sink: &mut S, first_row: u64) -> Result<()> {
        debug_assert!(self.is_open(), "row ended with no open row");
        let outcome = match sink.shape() {
            SinkShape::PerCell => self.announce(sink).and_then(|()| sink.end_row()),
            SinkShape::PerRow => sink.end_full_row(RowView::new(
                self.text.as_mut_str(),
                &self.offsets,
                first_row,
            )),
        };
        self.clear();
        outcome
    }

    /// Drop a row that never produced a cell; the sink never hears of it.
    pub(crate) fn abandon(&mut self) {
        debug_assert!(!self.announced, "abandoning an announced row");
        self.clear();
    }

    // begin_row goes out lazily so an abandoned row leaves no trace.
    fn announce<S: RowSink>(&mut self, sink: &mut S) -> Result<()> {
        if !self.announced {
            self.announced = true;
            sink.begin_row()?;
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.text.clear();
        self.offsets.clear();
        self.whitespace.clear();
        self.announced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RowCollector;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl RowSink for Log {
        fn begin_row(&mut self) -> Result<()> {
            self.0.push("begin".into());
            Ok(())
        }

        fn cell(&mut self, cell: Option<&mut str>) -> Result<()> {
            self.0.push(match cell {
                Some(text) => format!("cell:{text}"),
                None => "empty".into(),
            });
            Ok(())
        }

        fn end_row(&mut self) -> Result<()> {
            self.0.push("end".into());
            Ok(())
        }
    }

    #[rstest::rstest]
    fn test_per_cell_emission() {
        let mut buffer = RowBuffer::default();
        let mut log = Log::default();
        buffer.open();
        buffer.push('a');
        buffer.next_cell(&mut log).unwrap();
        buffer.next_cell(&mut log).unwrap();
        buffer.end_row(&mut log, 1).unwrap();
        assert_eq!(log.0, vec!["begin", "cell:a", "empty", "end"]);
        assert!(!buffer.is_open());
    }

    #[rstest::rstest]
    fn test_per_row_emission_and_reuse() {
        let mut buffer = RowBuffer::default();
        let mut rows = RowCollector::new();
        buffer.open();
        buffer.push('x');
        buffer.push_whitespace(' ');
        buffer.commit_whitespace();
        buffer.push('y');
        buffer.next_cell(&mut rows).unwrap();
        buffer.push('z');
        buffer.next_cell(&mut rows).unwrap();
        buffer.end_row(&mut rows, 7).unwrap();

        buffer.open();
        buffer.end_row(&mut rows, 8).unwrap();

        let rows = rows.into_rows();
        assert_eq!(rows[0].cells, vec!["x y", "z"]);
        assert_eq!(rows[0].first_row, 7);
        assert!(rows[1].is_empty());
        assert_eq!(rows[1].first_row, 8);
    }

    #[rstest::rstest]
    fn test_content_tracking() {
        let mut buffer = RowBuffer::default();
        buffer.open();
        assert!(!buffer.has_content());
        buffer.push_whitespace('\t');
        assert!(buffer.has_content());
        buffer.discard_whitespace();
        assert!(!buffer.has_content());
        assert_eq!(buffer.completed_cells(), 0);
        buffer.abandon();
        assert!(!buffer.is_open());
    }
}
