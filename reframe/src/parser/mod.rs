//! CSV table reading and writing with encoding and delimiter auto-detection.
//!
//! Rows are kept as ordered string cells so that passthrough columns are
//! written back exactly as they were read. No prompt logic here.

use encoding_rs::{Encoding, GB18030, GBK, UTF_8};
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// An ordered table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column headers, in file order
    pub headers: Vec<String>,
    /// Data rows. A row may be shorter than `headers` when the source was ragged.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the named column. Surrounding whitespace in header text is
    /// ignored for the lookup; the header itself is kept as read.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell at (row, column), if the row is long enough.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Set a whole column, appending it when it does not exist yet.
    ///
    /// Short rows are padded with empty cells so every row ends up as wide
    /// as the header. Values beyond the row count are ignored.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        let index = match self.column_index(name) {
            Some(i) => i,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        let width = self.headers.len();

        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() < width {
                row.resize(width, String::new());
            }
            row[index] = value;
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 wins outright. Chinese exports are usually GBK, which
/// chardet often misreads as a single-byte charset on short files, so a
/// clean GB18030 decode is preferred over any single-byte guess. A
/// multi-byte guess such as Big5 is kept when the bytes decode under it.
///
/// Returns a lowercase encoding name understood by [`decode_content`].
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(strip_bom(bytes)).is_ok() {
        return "utf-8".to_string();
    }

    let (charset, _, _) = chardet::detect(bytes);
    let guess = resolve_label(&charset).ok();

    if let Some(encoding) = guess.filter(|&e| !e.is_single_byte() && e != GB18030) {
        if decodes_cleanly(encoding, bytes) {
            return encoding_name(encoding);
        }
    }

    if decodes_cleanly(GB18030, bytes) {
        return encoding_name(GB18030);
    }

    match guess {
        Some(encoding) => encoding_name(encoding),
        None if charset.is_empty() => "unknown".to_string(),
        None => charset.to_lowercase(),
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Map a charset label to an `encoding_rs` encoding.
///
/// GBK and GB2312 resolve to their GB18030 superset.
fn resolve_label(label: &str) -> CsvResult<&'static Encoding> {
    let label = label.trim();
    let normalized = match label.to_lowercase().as_str() {
        "latin-1" => "latin1".to_string(),
        other => other.to_string(),
    };

    let encoding = Encoding::for_label(normalized.as_bytes())
        .ok_or_else(|| CsvError::EncodingError(label.to_string()))?;

    if encoding == GBK {
        Ok(GB18030)
    } else {
        Ok(encoding)
    }
}

fn decodes_cleanly(encoding: &'static Encoding, bytes: &[u8]) -> bool {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
}

fn encoding_name(encoding: &'static Encoding) -> String {
    encoding.name().to_lowercase()
}

/// Decode bytes to string using the specified encoding.
///
/// Labels follow the WHATWG encoding standard, so `iso-8859-1` and `ascii`
/// decode as Windows-1252. Unknown labels and malformed input are errors;
/// nothing is replaced silently.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let resolved = resolve_label(encoding)?;
    let body = if resolved == UTF_8 {
        strip_bom(bytes)
    } else {
        bytes
    };

    resolved
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|decoded| decoded.into_owned())
        .ok_or_else(|| CsvError::EncodingError(encoding.to_string()))
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// A single-column file has no separator at all, so comma is the default.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text into a [`Table`] with an explicit delimiter.
///
/// Header names and cell values are kept verbatim. Cells past the last
/// header are dropped.
///
/// # Example
/// ```ignore
/// use reframe::parser::parse_table;
///
/// let table = parse_table("id,task\n1,做饭", ',').unwrap();
/// assert_eq!(table.headers, vec!["id", "task"]);
/// assert_eq!(table.cell(0, 1), Some("做饭"));
/// ```
pub fn parse_table(content: &str, delimiter: char) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter))
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut table = Table::new(headers);
    let width = table.headers.len();

    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        let row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        table.rows.push(row);
    }

    Ok(table)
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        b','
    }
}

fn parse_error(err: csv::Error) -> CsvError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_table(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Write a table as UTF-8, comma-delimited CSV with a header row.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    out.write_record(&table.headers)?;
    for row in &table.rows {
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a table to a file, replacing any previous content.
pub fn write_table_file<P: AsRef<Path>>(path: P, table: &Table) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path.as_ref())?;
    write_table(std::io::BufWriter::new(file), table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_table("id,task\n1,做饭\n2,打架", ',').unwrap();

        assert_eq!(table.headers, vec!["id", "task"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), Some("做饭"));
        assert_eq!(table.cell(1, 0), Some("2"));
    }

    #[test]
    fn test_quoted_values_keep_commas() {
        let csv = "id,task\n1,\"blood, on the floor\"";
        let table = parse_table(csv, ',').unwrap();

        assert_eq!(table.cell(0, 1), Some("blood, on the floor"));
    }

    #[test]
    fn test_values_not_trimmed() {
        let table = parse_table("task,note\n a fight , x ", ',').unwrap();
        assert_eq!(table.cell(0, 0), Some(" a fight "));
    }

    #[test]
    fn test_short_rows_kept() {
        let table = parse_table("id,task\n1\n2,打架", ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(1, 1), Some("打架"));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let table = parse_table("a;b\n1;2;3;4", ';').unwrap();
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_table("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("task\n做饭"), ',');
    }

    #[test]
    fn test_auto_parse_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("task;id\n打架;1".as_bytes());
        let result = parse_bytes_auto(&bytes).unwrap();

        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.headers, vec!["task", "id"]);
        assert_eq!(result.table.cell(0, 0), Some("打架"));
    }

    #[test]
    fn test_gbk_decoding() {
        let (bytes, _, _) = encoding_rs::GBK.encode("打架");
        let decoded = decode_content(&bytes, "gb18030").unwrap();
        assert_eq!(decoded, "打架");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société ¤" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9, 0x20, 0xA4];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société ¤");
        assert_eq!(decode_content(bytes, "latin-1").unwrap(), decoded);
    }

    #[test]
    fn test_short_gbk_files_detected() {
        for task in ["打架", "做饭"] {
            let content = format!("task\n{}\n", task);
            let (bytes, _, _) = encoding_rs::GBK.encode(&content);
            let result = parse_bytes_auto(&bytes).unwrap();

            assert_eq!(result.encoding, "gb18030");
            assert_eq!(result.table.headers, vec!["task"]);
            assert_eq!(result.table.cell(0, 0), Some(task));
        }
    }

    #[test]
    fn test_big5_label_decoded() {
        let (bytes, _, _) = encoding_rs::BIG5.encode("task\n一個人在打架\n");
        let decoded = decode_content(&bytes, "Big5").unwrap();
        assert_eq!(decoded, "task\n一個人在打架\n");
    }

    #[test]
    fn test_unknown_or_malformed_encoding_is_error() {
        assert!(matches!(
            decode_content(b"task\nx", "klingon"),
            Err(CsvError::EncodingError(ref label)) if label == "klingon"
        ));
        // Lone GB18030 lead byte
        assert!(matches!(
            decode_content(&[b't', 0x81], "gb18030"),
            Err(CsvError::EncodingError(_))
        ));
        assert!(matches!(
            decode_content(&[0xFF, 0xFE, 0xFD], "utf-8"),
            Err(CsvError::EncodingError(_))
        ));
    }

    #[test]
    fn test_headers_kept_verbatim() {
        let table = parse_table(" task , note\n打架,x", ',').unwrap();

        assert_eq!(table.headers, vec![" task ", " note"]);
        assert_eq!(table.column_index("task"), Some(0));

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let reread = parse_table(&String::from_utf8(buf).unwrap(), ',').unwrap();
        assert_eq!(reread.headers, table.headers);
    }

    #[test]
    fn test_set_column_appends_and_pads() {
        let mut table = parse_table("id,task\n1\n2,打架", ',').unwrap();
        table.set_column("prompt_zh", vec!["a".into(), "b".into()]);

        assert_eq!(table.headers, vec!["id", "task", "prompt_zh"]);
        assert_eq!(table.rows[0], vec!["1", "", "a"]);
        assert_eq!(table.rows[1], vec!["2", "打架", "b"]);
    }

    #[test]
    fn test_set_column_overwrites_existing() {
        let mut table = parse_table("task,prompt_zh\n做饭,old", ',').unwrap();
        table.set_column("prompt_zh", vec!["new".into()]);

        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.cell(0, 1), Some("new"));
    }

    #[test]
    fn test_write_table_quotes_commas() {
        let mut table = Table::new(vec!["task".into(), "prompt_en".into()]);
        table.rows.push(vec!["fight".into(), "a, b".into()]);

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text, "task,prompt_en\nfight,\"a, b\"\n");
    }
}
