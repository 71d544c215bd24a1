//! Streaming tokenizer for CSV and other delimiter-separated text.
//!
//! [`Tokenizer`] is a character-level state machine. Input is pushed in
//! chunks of any size and rows are delivered to a [`RowSink`] as they
//! complete, either cell by cell or a whole row at a time.
//!
//! ```
//! use csvtok::{tokenize_str, TokenizerOptions};
//!
//! let rows = tokenize_str("name,quote\nAda,\"said \"\"hi\"\"\"\n", &TokenizerOptions::default())
//!     .unwrap();
//! assert_eq!(rows[1].cells, vec!["Ada", "said \"hi\""]);
//! ```

pub mod error;
pub mod options;
pub mod reader;
pub mod sink;
pub mod tokenize;

pub use crate::error::{Error, Location, ParseErrorKind};
pub use crate::options::{CharSet, TokenizerOptions};
pub use crate::reader::{feed_reader, tokenize_reader, DEFAULT_CHUNK_SIZE};
pub use crate::sink::{
    CellCallbacks, Row, RowCallback, RowCollector, RowSink, RowView, SinkShape,
};
pub use crate::tokenize::Tokenizer;

pub type Result<T> = std::result::Result<T, Error>;

/// Tokenize a complete input and collect its rows.
pub fn tokenize_str(input: &str, options: &TokenizerOptions) -> Result<Vec<Row>> {
    let mut tokenizer = Tokenizer::with_options(options.clone(), RowCollector::new());
    tokenizer.process_chunk(input)?;
    tokenizer.flush()?;
    Ok(tokenizer.into_sink().into_rows())
}
