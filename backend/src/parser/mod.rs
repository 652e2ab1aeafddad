//! CSV table reading and writing.
//!
//! The raw extract is read with encoding and delimiter auto-detection.
//! Every intermediate table is plain UTF-8, comma-delimited CSV.

mod types;

pub use types::{infer_kind, type_rows, ColumnKind};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult, PipelineResult, StageError};
use crate::models::{CuratedRow, Table};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Typed table
    pub table: Table,
    /// Encoding used to decode the bytes
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 always wins. Otherwise chardet picks within the Latin-1
/// family; any other guess on a raw extract is treated as Windows-1252.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(strip_bom(bytes)).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        _ => "windows-1252".to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Invalid UTF-8 falls back to Windows-1252, which covers printable Latin-1.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let bytes = strip_bom(bytes);
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        label => {
            let enc = encoding_rs::Encoding::for_label(label.as_bytes())
                .unwrap_or(encoding_rs::WINDOWS_1252);
            let (text, _, had_errors) = enc.decode(bytes);
            if had_errors {
                encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
            } else {
                text.into_owned()
            }
        }
    };
    Ok(decoded)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Detect the delimiter by counting occurrences in the first line
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

/// Parse CSV text into a typed table.
///
/// Blank lines are skipped, short rows are padded with missing cells,
/// and fields beyond the header width are ignored.
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Table> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CsvError::Encoding(format!("Delimiter '{}' is not ASCII", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut values: Vec<String> = record
            .iter()
            .take(headers.len())
            .map(str::to_string)
            .collect();
        values.resize(headers.len(), String::new());
        raw_rows.push(values);
    }

    let rows = type_rows(&headers, raw_rows);
    Ok(Table::from_rows(headers, rows))
}

/// Parse raw extract bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse an intermediate table: strict UTF-8, comma-delimited.
pub fn parse_utf8(bytes: &[u8]) -> CsvResult<Table> {
    let content = std::str::from_utf8(strip_bom(bytes))
        .map_err(|e| CsvError::Encoding(format!("Intermediate table is not UTF-8: {}", e)))?;
    parse_str(content, ',')
}

/// Read the raw extract from disk.
pub fn read_raw_file<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Read an intermediate table from disk.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> CsvResult<Table> {
    let bytes = fs::read(path.as_ref())?;
    parse_utf8(&bytes)
}

/// Write a table as UTF-8 CSV.
pub fn write_table<W: Write>(table: &Table, writer: W) -> CsvResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.columns())?;
    for row in table.rows() {
        out.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    out.flush()?;
    Ok(())
}

/// Render a table to CSV bytes.
pub fn table_to_bytes(table: &Table) -> CsvResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    Ok(buf)
}

/// Write a table to `path`, creating parent directories.
pub fn write_table_file<P: AsRef<Path>>(table: &Table, path: P) -> CsvResult<()> {
    let file = create_file(path.as_ref())?;
    write_table(table, file)
}

/// Write typed rows under their fixed header, even when there are none.
pub fn write_rows_file<T, P>(rows: &[T], path: P) -> CsvResult<()>
where
    T: Serialize + CuratedRow,
    P: AsRef<Path>,
{
    let file = create_file(path.as_ref())?;
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    out.write_record(T::COLUMNS)?;
    for row in rows {
        out.serialize(row)
            .map_err(|e| CsvError::Write(e.to_string()))?;
    }
    out.flush()?;
    Ok(())
}

/// Read typed rows, failing on the first required column that is absent.
pub fn read_rows_file<T, P>(path: P) -> PipelineResult<Vec<T>>
where
    T: DeserializeOwned + CuratedRow,
    P: AsRef<Path>,
{
    let bytes = fs::read(path.as_ref()).map_err(CsvError::from)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(strip_bom(&bytes));

    let headers = reader.headers().map_err(CsvError::from)?.clone();
    if let Some(missing) = T::COLUMNS
        .iter()
        .find(|c| !headers.iter().any(|h| h == **c))
    {
        return Err(StageError::missing_column(T::TABLE, *missing).into());
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(CsvError::from)?);
    }
    Ok(rows)
}

fn create_file(path: &Path) -> CsvResult<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::File::create(path)?)
}
