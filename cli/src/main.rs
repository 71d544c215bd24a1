use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Read, Write};

use clap::{ArgAction, Parser, ValueEnum};
use csvtok::{
    feed_reader, CharSet, RowSink, RowView, SinkShape, Tokenizer, TokenizerOptions,
    DEFAULT_CHUNK_SIZE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "csvtok", version, about = "Streaming CSV tokenizer")]
struct Args {
    /// Input file path. Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// JSON file with tokenizer options; flags below override it.
    #[arg(long, value_name = "file")]
    config: Option<String>,

    /// Separator characters, e.g. "," or "\t" or ";|".
    #[arg(short, long, value_name = "chars", value_parser = parse_chars)]
    separator: Option<CharSet>,

    /// Quote characters. An empty value disables quoting.
    #[arg(short, long, value_name = "chars", value_parser = parse_chars)]
    quote: Option<CharSet>,

    /// Comment characters. Comments are off unless given.
    #[arg(short, long, value_name = "chars", value_parser = parse_chars)]
    comment: Option<CharSet>,

    /// Strip unquoted leading and trailing whitespace from cells.
    #[arg(long)]
    trim: bool,

    /// Treat runs of separators as one.
    #[arg(long)]
    collapse: bool,

    /// Allow comments after cell content, not only at line start.
    #[arg(long)]
    comments_anywhere: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Jsonl)]
    format: Format,

    /// Bytes read from the input per chunk.
    #[arg(long, value_name = "bytes", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// More logging on stderr (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON array of strings per row.
    Jsonl,
    /// Tab-separated cells with \t, \n, \r and \\ escaped.
    Tsv,
    /// Only the number of rows and cells.
    Count,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if let Err(err) = run(&args) {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let options = resolve_options(args)?;
    tracing::debug!(?options, format = ?args.format, "resolved options");

    let input = open_input(args.input.as_deref())?;
    let output = open_output(args.output.as_deref())?;
    let mut tokenizer = Tokenizer::with_options(options, RowWriter::new(output, args.format));

    let outcome = feed_reader(&mut tokenizer, input, args.chunk_size).and_then(|consumed| {
        tracing::debug!(consumed, "input exhausted");
        tokenizer.flush()
    });
    if let Err(error) = outcome {
        return Err(Box::new(Failure {
            context: tokenizer.error_context(),
            error,
        }));
    }

    let writer = tokenizer.into_sink();
    tracing::info!(rows = writer.rows, cells = writer.cells, "done");
    writer.finish()?;
    Ok(())
}

fn resolve_options(args: &Args) -> Result<TokenizerOptions, Box<dyn Error>> {
    let mut options = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => TokenizerOptions::default(),
    };
    if let Some(separator) = &args.separator {
        options.separator = separator.clone();
    }
    if let Some(quote) = &args.quote {
        options.quote = quote.clone();
    }
    if let Some(comment) = &args.comment {
        options.comment = comment.clone();
    }
    if args.trim {
        options.trim_whitespace = true;
    }
    if args.collapse {
        options.collapse_separators = true;
    }
    if args.comments_anywhere {
        options.comments_at_line_start = false;
    }
    options.collect_error_context = true;
    Ok(options)
}

fn open_input(input: Option<&str>) -> Result<Box<dyn Read>, Box<dyn Error>> {
    match input {
        None | Some("-") => Ok(Box::new(io::stdin().lock())),
        Some(path) => Ok(Box::new(fs::File::open(path)?)),
    }
}

fn open_output(output: Option<&str>) -> Result<Box<dyn Write>, Box<dyn Error>> {
    match output {
        None | Some("-") => Ok(Box::new(io::stdout().lock())),
        Some(path) => Ok(Box::new(fs::File::create(path)?)),
    }
}

/// Accepts the two-character escapes `\t` and `\\` as well as the literal
/// characters. NUL and line breaks are rejected.
fn parse_chars(raw: &str) -> Result<CharSet, String> {
    let mut chars = Vec::new();
    let mut iter = raw.chars();
    while let Some(ch) = iter.next() {
        if ch != '\\' {
            chars.push(ch);
            continue;
        }
        match iter.next() {
            Some('t') => chars.push('\t'),
            Some('n') => chars.push('\n'),
            Some('r') => chars.push('\r'),
            Some('\\') | None => chars.push('\\'),
            Some(other) => return Err(format!("unknown escape \"\\{other}\"")),
        }
    }
    if chars.contains(&'\0') {
        return Err("NUL cannot be used as a delimiter".to_string());
    }
    if chars.iter().any(|ch| matches!(ch, '\n' | '\r')) {
        return Err("line breaks cannot be used as delimiters".to_string());
    }
    Ok(chars.into_iter().collect())
}

/// Parse error together with the offending line and caret.
#[derive(Debug)]
struct Failure {
    error: csvtok::Error,
    context: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.context.is_empty() {
            write!(f, "\n{}", self.context)?;
        }
        Ok(())
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

struct RowWriter {
    out: BufWriter<Box<dyn Write>>,
    format: Format,
    rows: u64,
    cells: u64,
}

impl RowWriter {
    fn new(out: Box<dyn Write>, format: Format) -> Self {
        Self {
            out: BufWriter::new(out),
            format,
            rows: 0,
            cells: 0,
        }
    }

    fn finish(mut self) -> io::Result<()> {
        if self.format == Format::Count {
            writeln!(self.out, "{} rows, {} cells", self.rows, self.cells)?;
        }
        self.out.flush()
    }
}

impl RowSink for RowWriter {
    fn shape(&self) -> SinkShape {
        SinkShape::PerRow
    }

    fn end_full_row(&mut self, row: RowView<'_>) -> csvtok::Result<()> {
        self.rows += 1;
        self.cells += row.len() as u64;
        match self.format {
            Format::Jsonl => {
                let cells: Vec<&str> = row.iter().collect();
                serde_json::to_writer(&mut self.out, &cells).map_err(io::Error::from)?;
                self.out.write_all(b"\n")?;
            }
            Format::Tsv => {
                for (idx, cell) in row.iter().enumerate() {
                    if idx > 0 {
                        self.out.write_all(b"\t")?;
                    }
                    write_escaped(&mut self.out, cell)?;
                }
                self.out.write_all(b"\n")?;
            }
            Format::Count => {}
        }
        Ok(())
    }
}

fn write_escaped(out: &mut impl Write, cell: &str) -> io::Result<()> {
    let mut start = 0;
    for (idx, ch) in cell.char_indices() {
        let escaped: &[u8] = match ch {
            '\t' => b"\\t",
            '\n' => b"\\n",
            '\r' => b"\\r",
            '\\' => b"\\\\",
            _ => continue,
        };
        out.write_all(cell[start..idx].as_bytes())?;
        out.write_all(escaped)?;
        start = idx + 1;
    }
    out.write_all(cell[start..].as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chars_understands_escapes() {
        assert_eq!(parse_chars("\\t").unwrap(), CharSet::single('\t'));
        assert_eq!(parse_chars(";|").unwrap(), CharSet::from(";|"));
        assert!(parse_chars("").unwrap().is_empty());
        assert!(parse_chars("\\x").is_err());
        assert!(parse_chars("\\n").is_err());
        assert!(parse_chars(",\r").is_err());
    }

    #[test]
    fn tsv_escaping() {
        let mut out = Vec::new();
        write_escaped(&mut out, "a\tb\\c\nd").unwrap();
        assert_eq!(out, b"a\\tb\\\\c\\nd");
    }
}
