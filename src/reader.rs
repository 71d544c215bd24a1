use std::io::{ErrorKind, Read};

use crate::sink::RowSink;
use crate::{Error, Result, Tokenizer, TokenizerOptions};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Tokenize everything `reader` yields and return the sink.
///
/// # Examples
/// ```
/// use csvtok::{tokenize_reader, RowCollector, TokenizerOptions};
///
/// let input = "id,name\r\n1,\"Ada\"\r\n".as_bytes();
/// let rows = tokenize_reader(input, &TokenizerOptions::default(), RowCollector::new())
///     .unwrap()
///     .into_rows();
/// assert_eq!(rows[1].cells, vec!["1", "Ada"]);
/// ```
pub fn tokenize_reader<R: Read, S: RowSink>(
    reader: R,
    options: &TokenizerOptions,
    sink: S,
) -> Result<S> {
    let mut tokenizer = Tokenizer::with_options(options.clone(), sink);
    feed_reader(&mut tokenizer, reader, DEFAULT_CHUNK_SIZE)?;
    tokenizer.flush()?;
    Ok(tokenizer.into_sink())
}

/// Push the bytes of `reader` into `tokenizer` in chunks of `chunk_size`,
/// without flushing. UTF-8 sequences cut by a read boundary are carried
/// over to the next chunk. Returns the number of bytes consumed.
pub fn feed_reader<R: Read, S: RowSink>(
    tokenizer: &mut Tokenizer<S>,
    mut reader: R,
    chunk_size: usize,
) -> Result<u64> {
    // Room for the longest incomplete sequence plus at least one new byte.
    let mut buf = vec![0u8; chunk_size.max(4)];
    let mut carry = 0;
    let mut consumed: u64 = 0;
    loop {
        let read = match reader.read(&mut buf[carry..]) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            if carry > 0 {
                return Err(Error::InvalidUtf8 { offset: consumed });
            }
            return Ok(consumed);
        }
        let filled = carry + read;
        let decoded = match std::str::from_utf8(&buf[..filled]) {
            Ok(text) => text.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                return Err(Error::InvalidUtf8 {
                    offset: consumed + err.valid_up_to() as u64,
                })
            }
        };
        let text = std::str::from_utf8(&buf[..decoded]).map_err(|err| Error::InvalidUtf8 {
            offset: consumed + err.valid_up_to() as u64,
        })?;
        tokenizer.process_chunk(text)?;
        consumed += decoded as u64;
        buf.copy_within(decoded..filled, 0);
        carry = filled - decoded;
    }
}
