use csvtok::{
    CellCallbacks, Error, Location, ParseErrorKind, Result, RowCollector, RowSink, RowView,
    SinkShape, Tokenizer, TokenizerOptions,
};
use rstest::rstest;

fn first_error(input: &str, options: TokenizerOptions) -> Error {
    let mut tokenizer = Tokenizer::with_options(options, RowCollector::new());
    match tokenizer.process_chunk(input) {
        Ok(()) => tokenizer
            .flush()
            .expect_err("expected the input to be rejected"),
        Err(err) => err,
    }
}

#[rstest]
#[case("a\rb", ParseErrorKind::CharAfterCr)]
#[case("a\r,", ParseErrorKind::SeparatorAfterCr)]
#[case("a\r\r", ParseErrorKind::CrAfterCr)]
#[case("a\r ", ParseErrorKind::WhitespaceAfterCr)]
#[case("a\r\"", ParseErrorKind::QuoteAfterCr)]
#[case("\"a\rb\"", ParseErrorKind::CharAfterCr)]
#[case("\"a\r\"", ParseErrorKind::QuoteAfterCr)]
#[case("\"a\"b", ParseErrorKind::CharAfterPossibleEndQuote)]
#[case("\"a\" b", ParseErrorKind::CharAfterEndQuote)]
#[case("\"a\" \"", ParseErrorKind::QuoteAfterEndQuote)]
#[case("a\0", ParseErrorKind::UnexpectedNul)]
#[case("\"a\0\"", ParseErrorKind::UnexpectedNul)]
fn error_kinds(#[case] input: &str, #[case] expected: ParseErrorKind) {
    assert_eq!(
        first_error(input, TokenizerOptions::default()).kind(),
        Some(expected)
    );
}

#[rstest]
fn comment_after_cr() {
    let options = TokenizerOptions::default().with_comment('#');
    assert_eq!(
        first_error("\r#", options).kind(),
        Some(ParseErrorKind::CommentAfterCr)
    );
}

#[rstest]
fn comment_char_in_quoted_line_start_mode_is_text_after_endquote() {
    let options = TokenizerOptions::default().with_comment('#');
    assert_eq!(
        first_error("\"x\"#c\n", options).kind(),
        Some(ParseErrorKind::CharAfterPossibleEndQuote)
    );
}

#[derive(Default)]
struct CellCount {
    cells: Vec<String>,
    rows: usize,
}

impl RowSink for CellCount {
    fn cell(&mut self, cell: Option<&mut str>) -> Result<()> {
        self.cells.push(cell.map(|text| text.to_string()).unwrap_or_default());
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        self.rows += 1;
        Ok(())
    }
}

#[rstest]
fn error_halts_the_chunk() {
    let mut tokenizer = Tokenizer::new(CellCount::default());
    let err = tokenizer.process_chunk("a,b\rc,d,e\n").unwrap_err();
    assert_eq!(
        err,
        Error::Parse {
            kind: ParseErrorKind::CharAfterCr,
            location: Location {
                row: 1,
                column: 5,
                offset: 4,
            },
        }
    );
    assert_eq!(tokenizer.sink().cells, vec!["a"]);
    assert_eq!(tokenizer.sink().rows, 0);
    assert_eq!(err.to_string(), "char after CR at row 1, column 5");
}

#[rstest]
fn error_is_sticky() {
    let mut tokenizer = Tokenizer::new(CellCount::default());
    let err = tokenizer.process_chunk("x\n\"a\"b").unwrap_err();
    assert_eq!(tokenizer.error(), Some(&err));

    assert_eq!(tokenizer.process_chunk("valid,row\n"), Err(err.clone()));
    assert_eq!(tokenizer.process_chunk(""), Err(err.clone()));
    assert_eq!(tokenizer.process(""), Err(err.clone()));
    assert_eq!(tokenizer.flush(), Err(err));
    assert_eq!(tokenizer.sink().rows, 1);
}

#[rstest]
fn error_offset_is_relative_to_the_failing_chunk() {
    let mut tokenizer = Tokenizer::new(RowCollector::new());
    tokenizer.process_chunk("abc,").unwrap();
    let err = tokenizer.process_chunk("d\r\"").unwrap_err();
    assert_eq!(
        err.location(),
        Some(Location {
            row: 1,
            column: 7,
            offset: 2,
        })
    );
}

#[rstest]
fn error_context_points_at_the_failing_column() {
    let options = TokenizerOptions::default().with_collect_error_context(true);
    let mut tokenizer = Tokenizer::with_options(options, RowCollector::new());
    assert_eq!(tokenizer.error_context(), "");
    let err = tokenizer.process_chunk("ok,1\nbad\r!x\n").unwrap_err();
    assert_eq!(err.kind(), Some(ParseErrorKind::CharAfterCr));
    assert_eq!(tokenizer.error_context(), "bad !\n    ^");
}

#[rstest]
fn error_context_disabled() {
    let mut tokenizer = Tokenizer::new(RowCollector::new());
    assert!(tokenizer.process_chunk("\"a\"b").is_err());
    assert_eq!(tokenizer.error_context(), "");
}

#[rstest]
fn cursor_tracking_and_reset() {
    let mut tokenizer = Tokenizer::new(RowCollector::new());
    assert_eq!((tokenizer.current_row(), tokenizer.current_column()), (1, 0));
    tokenizer.process_chunk("a\nbc").unwrap();
    assert_eq!((tokenizer.current_row(), tokenizer.current_column()), (2, 2));

    tokenizer.reset_cursor_location();
    assert_eq!((tokenizer.current_row(), tokenizer.current_column()), (1, 0));
    assert!(tokenizer.is_row_open());

    tokenizer.process_chunk("d\n").unwrap();
    assert_eq!((tokenizer.current_row(), tokenizer.current_column()), (2, 0));
    let rows = tokenizer.into_sink().into_rows();
    assert_eq!(rows[1].cells, vec!["bcd"]);
    assert_eq!(rows[1].first_row, 2);
}

#[rstest]
fn missing_callable_is_reported() {
    let mut tokenizer = Tokenizer::new(CellCallbacks::new());
    assert_eq!(
        tokenizer.process_chunk("a\n"),
        Err(Error::NoCallable("begin_row"))
    );
    assert_eq!(tokenizer.flush(), Err(Error::NoCallable("begin_row")));

    let mut seen = 0;
    let sink = CellCallbacks::new()
        .on_begin_row(|| {})
        .on_cell(|_| seen += 1);
    let mut tokenizer = Tokenizer::new(sink);
    assert_eq!(
        tokenizer.process_chunk("a,b\n"),
        Err(Error::NoCallable("end_row"))
    );
    drop(tokenizer);
    assert_eq!(seen, 2);
}

struct RejectSecondRow {
    seen: usize,
}

impl RowSink for RejectSecondRow {
    fn shape(&self) -> SinkShape {
        SinkShape::PerRow
    }

    fn end_full_row(&mut self, _row: RowView<'_>) -> Result<()> {
        self.seen += 1;
        if self.seen == 2 {
            return Err(Error::sink("second row"));
        }
        Ok(())
    }
}

#[rstest]
fn sink_errors_stop_tokenizing() {
    let mut tokenizer = Tokenizer::new(RejectSecondRow { seen: 0 });
    let err = tokenizer.process_chunk("1\n2\n3\n").unwrap_err();
    assert_eq!(err, Error::Sink("second row".into()));
    assert_eq!(err.kind(), None);
    assert_eq!(tokenizer.process_chunk("4\n"), Err(err));
    assert_eq!(tokenizer.sink().seen, 2);
    assert_eq!(tokenizer.current_row(), 2);
}
