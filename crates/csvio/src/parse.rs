//! Character-level CSV line parser.
//!
//! [`LineParser`] turns a character stream into successive rows: ordered
//! sequences of field strings. It is a single-pass state machine per
//! logical row, which may span multiple physical lines when a quoted
//! field contains embedded line terminators.
//!
//! # Dialect
//!
//! The delimiter, text qualifier and line separator come from
//! [`CsvSettings`]. On input, `\n` and `\r\n` always terminate a row in
//! addition to the configured separator; on output only the configured
//! separator is used (see [`RowWriter`](crate::writer::RowWriter)).
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use csvio::parse::LineParser;
//! use csvio::settings::CsvSettings;
//!
//! let input = Cursor::new("a,\"b,c\"\n");
//! let mut parser = LineParser::new(input, CsvSettings::default());
//!
//! let row = parser.read_row().unwrap().unwrap();
//! assert_eq!(row, vec![Some("a".to_string()), Some("b,c".to_string())]);
//! assert!(parser.read_row().unwrap().is_none());
//! ```

use std::{collections::VecDeque, io::BufRead};

use crate::{
    error::{CsvError, CsvResult},
    settings::CsvSettings,
};

/// One field of a row. `None` is the null marker, produced only when
/// [`CsvSettings::allow_null`] is set and an unquoted field equals the
/// configured sentinel.
pub type Field = Option<String>;

/// One parsed row: an ordered sequence of fields, owned by the caller.
pub type Row = Vec<Field>;

/// What ended the field that was just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldEnd {
    /// The field delimiter; more fields follow on this row.
    Delimiter,
    /// A row terminator; the row is complete.
    RowEnd,
    /// End of stream; the row is complete and the stream is exhausted.
    Eof,
}

/// Streaming CSV row parser over a buffered character source.
///
/// Produces a lazy, finite, forward-only sequence of rows via
/// [`read_row`](Self::read_row); returns `Ok(None)` once the source is
/// exhausted with no residual data.
pub struct LineParser<R> {
    input: R,
    settings: CsvSettings,
    /// Configured line separator, pre-split for lookahead matching.
    separator: Vec<char>,
    /// Pushback queue for decoded characters.
    pending: VecDeque<char>,
    /// Physical line number, 1-based.
    line: usize,
}

impl<R: BufRead> LineParser<R> {
    /// Creates a parser over a buffered reader.
    pub fn new(input: R, settings: CsvSettings) -> Self {
        let separator = settings.line_separator.chars().collect();
        Self { input, settings, separator, pending: VecDeque::new(), line: 1 }
    }

    /// Current physical line number (1-based), for diagnostics.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Settings this parser was created with.
    #[must_use]
    pub fn settings(&self) -> &CsvSettings {
        &self.settings
    }

    /// Consumes the parser, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Reads the next logical row.
    ///
    /// Returns `Ok(Some(row))` if a row was read, `Ok(None)` once the
    /// stream is exhausted. A trailing line terminator does not produce
    /// an empty row; an interior empty physical line parses as a row
    /// with a single empty field.
    ///
    /// # Errors
    ///
    /// [`CsvError::MalformedQuoting`] if the stream ends inside a quoted
    /// field (unless `ignore_errors` permits returning the partial
    /// field), [`CsvError::InvalidUtf8`] on undecodable input bytes.
    pub fn read_row(&mut self) -> CsvResult<Option<Row>> {
        if self.peek_char()?.is_none() {
            return Ok(None);
        }

        let mut row = Row::new();
        loop {
            let (field, end) = self.read_field()?;
            row.push(field);
            match end {
                FieldEnd::Delimiter => {}
                FieldEnd::RowEnd | FieldEnd::Eof => return Ok(Some(row)),
            }
        }
    }

    /// Reads one field; the qualifier is recognized only as the first
    /// character of the field.
    fn read_field(&mut self) -> CsvResult<(Field, FieldEnd)> {
        match self.peek_char()? {
            // Reachable after a trailing delimiter: the final field is empty.
            None => Ok((self.finish_unquoted(String::new()), FieldEnd::Eof)),
            Some(c) if self.settings.qualifier == Some(c) => {
                self.next_char()?;
                self.read_quoted(c)
            }
            Some(_) => self.read_unquoted(),
        }
    }

    /// Scans an unquoted field up to the delimiter, a row terminator or EOF.
    fn read_unquoted(&mut self) -> CsvResult<(Field, FieldEnd)> {
        let mut buf = String::new();
        loop {
            match self.next_char()? {
                None => return Ok((self.finish_unquoted(buf), FieldEnd::Eof)),
                Some(c) if c == self.settings.delimiter => {
                    return Ok((self.finish_unquoted(buf), FieldEnd::Delimiter));
                }
                Some(c) => {
                    if self.consume_row_end(c)? {
                        return Ok((self.finish_unquoted(buf), FieldEnd::RowEnd));
                    }
                    buf.push(c);
                }
            }
        }
    }

    /// Applies the unquoted-field policies: whitespace trim, null sentinel.
    fn finish_unquoted(&self, text: String) -> Field {
        let text =
            if self.settings.trim_whitespace { text.trim().to_string() } else { text };
        if self.settings.allow_null && text == self.settings.null_sentinel {
            return None;
        }
        Some(text)
    }

    /// Scans a quoted field. A doubled qualifier un-escapes to a single
    /// literal qualifier; a lone qualifier closes the field; line
    /// terminators inside quotes are literal data.
    fn read_quoted(&mut self, qualifier: char) -> CsvResult<(Field, FieldEnd)> {
        let opened_at = self.line;
        let mut buf = String::new();
        loop {
            match self.next_char()? {
                None => {
                    if self.settings.ignore_errors {
                        // Tolerance: yield the partial field read so far.
                        return Ok((Some(buf), FieldEnd::Eof));
                    }
                    return Err(CsvError::MalformedQuoting { line: opened_at });
                }
                Some(c) if c == qualifier => {
                    if self.peek_char()? == Some(qualifier) {
                        self.next_char()?;
                        buf.push(qualifier);
                    } else {
                        return self.finish_quoted(buf);
                    }
                }
                Some('\n') => {
                    self.line += 1;
                    buf.push('\n');
                }
                Some(c) => buf.push(c),
            }
        }
    }

    /// Consumes the tail between a closing qualifier and the field
    /// boundary. Stray characters there are appended leniently; quoted
    /// fields are never trimmed or sentinel-matched.
    fn finish_quoted(&mut self, mut buf: String) -> CsvResult<(Field, FieldEnd)> {
        loop {
            match self.next_char()? {
                None => return Ok((Some(buf), FieldEnd::Eof)),
                Some(c) if c == self.settings.delimiter => {
                    return Ok((Some(buf), FieldEnd::Delimiter));
                }
                Some(c) => {
                    if self.consume_row_end(c)? {
                        return Ok((Some(buf), FieldEnd::RowEnd));
                    }
                    buf.push(c);
                }
            }
        }
    }

    /// Returns `true` if `c` begins a row terminator, consuming the rest
    /// of it. `\n` and `\r\n` are always accepted; the configured
    /// separator is matched with lookahead and pushback on failure.
    fn consume_row_end(&mut self, c: char) -> CsvResult<bool> {
        if c == '\n' {
            self.line += 1;
            return Ok(true);
        }
        if c == '\r' && self.peek_char()? == Some('\n') {
            self.next_char()?;
            self.line += 1;
            return Ok(true);
        }

        if self.separator.first() == Some(&c) {
            let mut consumed = Vec::new();
            for i in 1..self.separator.len() {
                let want = self.separator[i];
                match self.peek_char()? {
                    Some(got) if got == want => {
                        self.next_char()?;
                        consumed.push(got);
                    }
                    _ => {
                        // Not the separator after all: undo the lookahead.
                        for &got in consumed.iter().rev() {
                            self.pending.push_front(got);
                        }
                        return Ok(false);
                    }
                }
            }
            self.line += 1;
            return Ok(true);
        }

        Ok(false)
    }

    // === Incremental UTF-8 character reading ===

    fn next_char(&mut self) -> CsvResult<Option<char>> {
        if let Some(c) = self.pending.pop_front() {
            return Ok(Some(c));
        }
        self.decode_char()
    }

    fn peek_char(&mut self) -> CsvResult<Option<char>> {
        if let Some(&c) = self.pending.front() {
            return Ok(Some(c));
        }
        match self.decode_char()? {
            Some(c) => {
                self.pending.push_front(c);
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    /// Decodes one UTF-8 character from the underlying reader.
    fn decode_char(&mut self) -> CsvResult<Option<char>> {
        let mut buf = [0u8; 4];
        if self.input.read(&mut buf[..1])? == 0 {
            return Ok(None);
        }

        let len = utf8_sequence_len(buf[0])
            .ok_or(CsvError::InvalidUtf8 { line: self.line })?;
        if len > 1 {
            self.input
                .read_exact(&mut buf[1..len])
                .map_err(|_| CsvError::InvalidUtf8 { line: self.line })?;
        }

        let text = std::str::from_utf8(&buf[..len])
            .map_err(|_| CsvError::InvalidUtf8 { line: self.line })?;
        Ok(text.chars().next())
    }
}

/// Length of the UTF-8 sequence started by `first`, or `None` for a
/// continuation or invalid leading byte.
fn utf8_sequence_len(first: u8) -> Option<usize> {
    match first {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn parse_all(input: &str, settings: CsvSettings) -> Vec<Row> {
        let mut parser = LineParser::new(Cursor::new(input.to_string()), settings);
        let mut rows = Vec::new();
        while let Some(row) = parser.read_row().unwrap() {
            rows.push(row);
        }
        rows
    }

    fn s(text: &str) -> Field {
        Some(text.to_string())
    }

    #[test]
    fn test_simple_rows() {
        let rows = parse_all("a,b,c\n1,2,3\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a"), s("b"), s("c")], vec![s("1"), s("2"), s("3")]]);
    }

    #[test]
    fn test_no_trailing_newline() {
        let rows = parse_all("a,b", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a"), s("b")]]);
    }

    #[test]
    fn test_trailing_newline_is_end_marker() {
        let rows = parse_all("a\n", CsvSettings::default());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_interior_empty_line_is_empty_row() {
        let rows = parse_all("a\n\nb\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a")], vec![s("")], vec![s("b")]]);
    }

    #[test]
    fn test_empty_fields() {
        let rows = parse_all(",,\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s(""), s(""), s("")]]);
    }

    #[test]
    fn test_trailing_delimiter_then_eof() {
        let rows = parse_all("a,", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a"), s("")]]);
    }

    #[test]
    fn test_quoted_field_with_delimiter() {
        let rows = parse_all("a,\"b,c\",d\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a"), s("b,c"), s("d")]]);
    }

    #[test]
    fn test_escaped_qualifier() {
        let rows = parse_all("\"she said \"\"hi\"\"\",2\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("she said \"hi\""), s("2")]]);
    }

    #[test]
    fn test_multi_line_field() {
        let rows = parse_all("a,\"line1\nline2\",b\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a"), s("line1\nline2"), s("b")]]);
    }

    #[test]
    fn test_crlf_rows() {
        let rows = parse_all("a,b\r\nc,d\r\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a"), s("b")], vec![s("c"), s("d")]]);
    }

    #[test]
    fn test_crlf_inside_quotes_is_literal() {
        let rows = parse_all("\"a\r\nb\"\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a\r\nb")]]);
    }

    #[test]
    fn test_lone_cr_is_data_by_default() {
        // "\r" not followed by "\n" and not the configured separator.
        let rows = parse_all("a\rb,c\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("a\rb"), s("c")]]);
    }

    #[test]
    fn test_configured_separator_accepted() {
        let settings = CsvSettings::default().with_line_separator(";;");
        let rows = parse_all("a,b;;c,d;;", settings);
        assert_eq!(rows, vec![vec![s("a"), s("b")], vec![s("c"), s("d")]]);
    }

    #[test]
    fn test_separator_prefix_pushback() {
        // ';' begins the configured ";;" separator but a single ';' is data.
        let settings = CsvSettings::default().with_line_separator(";;");
        let rows = parse_all("a;b;;", settings);
        assert_eq!(rows, vec![vec![s("a;b")]]);
    }

    #[test]
    fn test_builtin_newline_still_accepted_with_custom_separator() {
        let settings = CsvSettings::default().with_line_separator("|");
        let rows = parse_all("a,b\nc,d|", settings);
        assert_eq!(rows, vec![vec![s("a"), s("b")], vec![s("c"), s("d")]]);
    }

    #[test]
    fn test_custom_delimiter_and_qualifier() {
        let settings = CsvSettings::default().with_delimiter(';').with_qualifier('\'');
        let rows = parse_all("a;'b;c';d\n", settings);
        assert_eq!(rows, vec![vec![s("a"), s("b;c"), s("d")]]);
    }

    #[test]
    fn test_disabled_qualifier_treats_quote_as_data() {
        let settings = CsvSettings::default().without_qualifier();
        let rows = parse_all("\"a\",b\n", settings);
        assert_eq!(rows, vec![vec![s("\"a\""), s("b")]]);
    }

    #[test]
    fn test_qualifier_mid_field_is_data() {
        // The qualifier only opens a field as its first character.
        let rows = parse_all("ab\"cd\",e\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("ab\"cd\""), s("e")]]);
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let mut parser =
            LineParser::new(Cursor::new("\"abc".to_string()), CsvSettings::default());
        let err = parser.read_row().unwrap_err();
        assert!(matches!(err, CsvError::MalformedQuoting { line: 1 }));
    }

    #[test]
    fn test_unterminated_quote_tolerated() {
        let settings = CsvSettings::default().with_ignore_errors();
        let rows = parse_all("a,\"bc", settings);
        assert_eq!(rows, vec![vec![s("a"), s("bc")]]);
    }

    #[test]
    fn test_null_sentinel_unquoted() {
        let settings = CsvSettings::default().with_allow_null("NULL");
        let rows = parse_all("a,NULL,b\n", settings);
        assert_eq!(rows, vec![vec![s("a"), None, s("b")]]);
    }

    #[test]
    fn test_quoted_sentinel_stays_literal() {
        let settings = CsvSettings::default().with_allow_null("NULL");
        let rows = parse_all("\"NULL\"\n", settings);
        assert_eq!(rows, vec![vec![s("NULL")]]);
    }

    #[test]
    fn test_sentinel_ignored_without_allow_null() {
        let rows = parse_all("NULL\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("NULL")]]);
    }

    #[test]
    fn test_trim_whitespace() {
        let settings = CsvSettings::default().with_trim_whitespace();
        let rows = parse_all("  a , b\t,\" c \"\n", settings);
        assert_eq!(rows, vec![vec![s("a"), s("b"), s(" c ")]]);
    }

    #[test]
    fn test_whitespace_kept_by_default() {
        let rows = parse_all(" a ,b\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s(" a "), s("b")]]);
    }

    #[test]
    fn test_multibyte_characters() {
        let rows = parse_all("Пополнение,через терминал\n", CsvSettings::default());
        assert_eq!(rows, vec![vec![s("Пополнение"), s("через терминал")]]);
    }

    #[test]
    fn test_line_counter_spans_quoted_newlines() {
        let mut parser = LineParser::new(
            Cursor::new("\"a\nb\"\nx\n".to_string()),
            CsvSettings::default(),
        );
        parser.read_row().unwrap().unwrap();
        // One embedded newline plus the row terminator.
        assert_eq!(parser.line(), 3);
    }

    #[test]
    fn test_empty_input_is_end_marker() {
        let mut parser =
            LineParser::new(Cursor::new(String::new()), CsvSettings::default());
        assert!(parser.read_row().unwrap().is_none());
    }
}
