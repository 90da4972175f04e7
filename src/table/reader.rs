// Streaming record reader
//
// One record per line, except that a quoted field may run across line breaks.
// `\n`, `\r\n` and a lone `\r` all end a line, and each is handed to the
// parser as `\n`.
// Blank lines are NOT skipped: they come back as empty records, because the
// aligner must emit one output row per input row.

use super::{Record, DELIMITER};
use std::io::{self, BufRead};
use std::mem::take;

const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartRecord,
    StartField,
    InField,
    InQuoted,
    QuoteInQuoted,
    Done,
}

/// Character-level parser for a single logical record
struct RecordParser {
    state: State,
    field: String,
    record: Record,
}

impl RecordParser {
    fn new() -> Self {
        Self {
            state: State::StartRecord,
            field: String::new(),
            record: Vec::new(),
        }
    }

    /// True while an opened quote is waiting for its closing quote
    fn needs_more(&self) -> bool {
        self.state == State::InQuoted
    }

    fn end_field(&mut self) {
        self.record.push(take(&mut self.field));
    }

    fn end_record(&mut self) {
        match self.state {
            // An empty line is an empty record, not a record with one empty field
            State::StartRecord | State::Done => {}
            _ => self.end_field(),
        }
        self.state = State::Done;
    }

    fn feed(&mut self, text: &str) {
        for ch in text.chars() {
            match self.state {
                State::Done => return,
                State::StartRecord | State::StartField => match ch {
                    QUOTE => self.state = State::InQuoted,
                    DELIMITER => {
                        self.end_field();
                        self.state = State::StartField;
                    }
                    '\r' | '\n' => self.end_record(),
                    c => {
                        self.field.push(c);
                        self.state = State::InField;
                    }
                },
                State::InField => match ch {
                    DELIMITER => {
                        self.end_field();
                        self.state = State::StartField;
                    }
                    '\r' | '\n' => self.end_record(),
                    // a quote inside an unquoted field is literal
                    c => self.field.push(c),
                },
                State::InQuoted => match ch {
                    QUOTE => self.state = State::QuoteInQuoted,
                    c => self.field.push(c),
                },
                State::QuoteInQuoted => match ch {
                    QUOTE => {
                        // doubled quote escape
                        self.field.push(QUOTE);
                        self.state = State::InQuoted;
                    }
                    DELIMITER => {
                        self.end_field();
                        self.state = State::StartField;
                    }
                    '\r' | '\n' => self.end_record(),
                    c => {
                        self.field.push(c);
                        self.state = State::InField;
                    }
                },
            }
        }
    }

    fn finish(mut self) -> Record {
        self.end_record();
        self.record
    }
}

/// Parse one line of text into its fields
///
/// Any line terminator at the end is ignored. An empty string yields an
/// empty record.
pub fn parse_line(line: &str) -> Record {
    let mut parser = RecordParser::new();
    parser.feed(line);
    parser.finish()
}

/// Reads records one at a time from any buffered source
///
/// Invalid UTF-8 is replaced rather than rejected; web-server logs routinely
/// carry raw bytes from request lines and user agents.
pub struct RecordReader<R> {
    inner: R,
    buf: Vec<u8>,
    // last line ended in `\r`; a `\n` right after it belongs to that line
    skip_lf: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            skip_lf: false,
        }
    }

    fn read_physical_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();

        if self.skip_lf {
            self.skip_lf = false;
            if self.inner.fill_buf()?.first() == Some(&b'\n') {
                self.inner.consume(1);
            }
        }

        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                break;
            }

            match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(i) => {
                    self.skip_lf = available[i] == b'\r';
                    self.buf.extend_from_slice(&available[..i]);
                    self.buf.push(b'\n');
                    self.inner.consume(i + 1);
                    break;
                }
                None => {
                    let len = available.len();
                    self.buf.extend_from_slice(available);
                    self.inner.consume(len);
                }
            }
        }

        if self.buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Read the next logical record, or `None` at end of input
    pub fn read_record(&mut self) -> io::Result<Option<Record>> {
        let Some(line) = self.read_physical_line()? else {
            return Ok(None);
        };

        let mut parser = RecordParser::new();
        parser.feed(&line);

        // Quoted field spans a line break: keep pulling lines until it closes
        while parser.needs_more() {
            match self.read_physical_line()? {
                Some(next) => parser.feed(&next),
                None => break,
            }
        }

        Ok(Some(parser.finish()))
    }

    /// Read the first record as a header; empty input gives an empty header
    pub fn read_header(&mut self) -> io::Result<Record> {
        Ok(self.read_record()?.unwrap_or_default())
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
