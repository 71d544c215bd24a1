//! Receivers for the rows and cells produced by the tokenizer.
//!
//! A sink picks one of two shapes. [`SinkShape::PerCell`] sinks get
//! `begin_row`, one `cell` per cell and `end_row`. [`SinkShape::PerRow`] sinks
//! get a single `end_full_row` per row carrying the whole row at once.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkShape {
    #[default]
    PerCell,
    PerRow,
}

/// A completed row, borrowed from the tokenizer's row buffer.
///
/// `offsets` has one entry per cell plus a final one-past-the-end entry, so
/// cell `i` is `buffer[offsets[i]..offsets[i + 1]]`. The buffer is mutable so
/// consumers may rewrite cell text in place before it is cleared.
#[derive(Debug)]
pub struct RowView<'a> {
    buffer: &'a mut str,
    offsets: &'a [usize],
    first_row: u64,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(buffer: &'a mut str, offsets: &'a [usize], first_row: u64) -> Self {
        Self {
            buffer,
            offsets,
            first_row,
        }
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The physical line on which the row started.
    pub fn first_row(&self) -> u64 {
        self.first_row
    }

    pub fn buffer(&self) -> &str {
        &*self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut str {
        &mut *self.buffer
    }

    pub fn offsets(&self) -> &[usize] {
        self.offsets
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        let (start, end) = self.bounds(index)?;
        Some(&self.buffer[start..end])
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut str> {
        let (start, end) = self.bounds(index)?;
        Some(&mut self.buffer[start..end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.offsets
            .windows(2)
            .map(move |pair| &self.buffer[pair[0]..pair[1]])
    }

    /// Copy the row out of the tokenizer's buffer.
    pub fn to_row(&self) -> Row {
        Row {
            cells: self.iter().map(str::to_owned).collect(),
            first_row: self.first_row,
        }
    }

    fn bounds(&self, index: usize) -> Option<(usize, usize)> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some((start, end))
    }
}

/// An owned row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
    pub first_row: u64,
}

impl Row {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Receives tokenizer output.
///
/// Every method has a no-op default, so a sink only implements the calls of
/// the shape it reports from [`RowSink::shape`]. Returning an error aborts
/// tokenization; the error becomes the tokenizer's sticky error. Sinks must
/// not call back into the tokenizer.
pub trait RowSink {
    fn shape(&self) -> SinkShape {
        SinkShape::PerCell
    }

    /// Sent just before the first [`RowSink::cell`] or [`RowSink::end_row`]
    /// of a row, not at its first character, so a line that turns out to be
    /// a comment never produces a `begin_row`.
    fn begin_row(&mut self) -> Result<()> {
        Ok(())
    }

    /// `None` marks an empty cell.
    fn cell(&mut self, _cell: Option<&mut str>) -> Result<()> {
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_full_row(&mut self, _row: RowView<'_>) -> Result<()> {
        Ok(())
    }
}

impl<T: RowSink + ?Sized> RowSink for &mut T {
    fn shape(&self) -> SinkShape {
        (**self).shape()
    }

    fn begin_row(&mut self) -> Result<()> {
        (**self).begin_row()
    }

    fn cell(&mut self, cell: Option<&mut str>) -> Result<()> {
        (**self).cell(cell)
    }

    fn end_row(&mut self) -> Result<()> {
        (**self).end_row()
    }

    fn end_full_row(&mut self, row: RowView<'_>) -> Result<()> {
        (**self).end_full_row(row)
    }
}

impl<T: RowSink + ?Sized> RowSink for Box<T> {
    fn shape(&self) -> SinkShape {
        (**self).shape()
    }

    fn begin_row(&mut self) -> Result<()> {
        (**self).begin_row()
    }

    fn cell(&mut self, cell: Option<&mut str>) -> Result<()> {
        (**self).cell(cell)
    }

    fn end_row(&mut self) -> Result<()> {
        (**self).end_row()
    }

    fn end_full_row(&mut self, row: RowView<'_>) -> Result<()> {
        (**self).end_full_row(row)
    }
}

/// Per-row sink that copies every row into memory.
#[derive(Debug, Default)]
pub struct RowCollector {
    rows: Vec<Row>,
}

impl RowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl RowSink for RowCollector {
    fn shape(&self) -> SinkShape {
        SinkShape::PerRow
    }

    fn end_full_row(&mut self, row: RowView<'_>) -> Result<()> {
        self.rows.push(row.to_row());
        Ok(())
    }
}

type BeginRowFn<'a> = Box<dyn FnMut() + 'a>;
type CellFn<'a> = Box<dyn FnMut(Option<&mut str>) + 'a>;
type EndRowFn<'a> = Box<dyn FnMut() + 'a>;
type FullRowFn<'a> = Box<dyn FnMut(RowView<'_>) + 'a>;

/// Per-cell sink backed by closures.
///
/// An event with no closure attached fails with [`Error::NoCallable`].
#[derive(Default)]
pub struct CellCallbacks<'a> {
    begin_row: Option<BeginRowFn<'a>>,
    cell: Option<CellFn<'a>>,
    end_row: Option<EndRowFn<'a>>,
}

impl<'a> CellCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_begin_row(mut self, f: impl FnMut() + 'a) -> Self {
        self.begin_row = Some(Box::new(f));
        self
    }

    pub fn on_cell(mut self, f: impl FnMut(Option<&mut str>) + 'a) -> Self {
        self.cell = Some(Box::new(f));
        self
    }

    pub fn on_end_row(mut self, f: impl FnMut() + 'a) -> Self {
        self.end_row = Some(Box::new(f));
        self
    }
}

impl RowSink for CellCallbacks<'_> {
    fn begin_row(&mut self) -> Result<()> {
        let f = self.begin_row.as_mut().ok_or(Error::NoCallable("begin_row"))?;
        f();
        Ok(())
    }

    fn cell(&mut self, cell: Option<&mut str>) -> Result<()> {
        let f = self.cell.as_mut().ok_or(Error::NoCallable("cell"))?;
        f(cell);
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        let f = self.end_row.as_mut().ok_or(Error::NoCallable("end_row"))?;
        f();
        Ok(())
    }
}

/// Per-row sink backed by a closure.
#[derive(Default)]
pub struct RowCallback<'a> {
    full_row: Option<FullRowFn<'a>>,
}

impl<'a> RowCallback<'a> {
    pub fn new(f: impl FnMut(RowView<'_>) + 'a) -> Self {
        Self {
            full_row: Some(Box::new(f)),
        }
    }
}

impl RowSink for RowCallback<'_> {
    fn shape(&self) -> SinkShape {
        SinkShape::PerRow
    }

    fn end_full_row(&mut self, row: RowView<'_>) -> Result<()> {
        let f = self.full_row.as_mut().ok_or(Error::NoCallable("end_full_row"))?;
        f(row);
        Ok(())
    }
}
