//! Tabular file decoding: spreadsheet or JSON bytes into header-keyed rows.
//!
//! Only the first worksheet of an OOXML workbook is read. Its first
//! non-empty row is the header; every later row with at least one cell
//! becomes a [`Row`] keyed by header text. Empty cells are left out of the
//! row, matching what the normalizer treats as absent anyway.
//!
//! JSON input must be an array of objects, one object per row.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::Path;

use nexus_catalog_core::models::value_text;
use nexus_catalog_core::Row;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Header text used for columns whose header cell is empty.
const EMPTY_HEADER: &str = "__EMPTY";
/// Phonetic reading run; its `<t>` text is not part of the cell value.
const PHONETIC_RUN: &[u8] = b"rPh";

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported file format: {0} (expected .xlsx, .xlsm or .json)")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("not a valid workbook: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("malformed workbook XML in {entry}: {message}")]
    Xml { entry: String, message: String },

    #[error("workbook entry {name} exceeds size limit ({limit} bytes)")]
    EntryTooLarge { name: String, limit: u64 },

    #[error("workbook has no worksheets")]
    MissingWorksheet,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON input must be an array of row objects")]
    NotAnArray,
}

/// Input formats the decoder understands, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Workbook,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(Format::Workbook),
            "json" => Ok(Format::Json),
            _ => Err(DecodeError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read and decode a file, keeping at most `max_rows` data rows.
pub fn decode_file(path: &Path, max_rows: usize) -> Result<Vec<Row>, DecodeError> {
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_bytes(&bytes, format, max_rows)
}

pub fn decode_bytes(bytes: &[u8], format: Format, max_rows: usize) -> Result<Vec<Row>, DecodeError> {
    let rows = match format {
        Format::Workbook => decode_workbook(bytes, max_rows)?,
        Format::Json => decode_json(bytes, max_rows)?,
    };
    debug!(rows = rows.len(), ?format, "decoded tabular input");
    Ok(rows)
}

fn decode_json(bytes: &[u8], max_rows: usize) -> Result<Vec<Row>, DecodeError> {
    let Value::Array(items) = serde_json::from_slice::<Value>(bytes)? else {
        return Err(DecodeError::NotAnArray);
    };
    let total = items.len();
    let mut rows = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if rows.len() >= max_rows {
            warn!(max_rows, total, "row limit reached, ignoring remaining rows");
            break;
        }
        match item {
            Value::Object(map) => rows.push(map),
            other => warn!(index, kind = json_kind(&other), "skipping non-object row"),
        }
    }
    Ok(rows)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ----- Workbook -----

fn decode_workbook(bytes: &[u8], max_rows: usize) -> Result<Vec<Row>, DecodeError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let shared_strings = match read_optional_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let sheet = first_sheet_path(&mut archive)?;
    debug!(sheet = %sheet, shared = shared_strings.len(), "reading worksheet");
    let xml = read_optional_entry(&mut archive, &sheet)?.ok_or(DecodeError::MissingWorksheet)?;
    let cells = parse_sheet(&xml, &sheet, &shared_strings)?;
    Ok(rows_from_cells(cells, max_rows))
}

fn read_optional_entry(archive: &mut Archive<'_>, name: &str) -> Result<Option<Vec<u8>>, DecodeError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::Xml {
            entry: name.to_string(),
            message: e.to_string(),
        })?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(DecodeError::EntryTooLarge {
            name: name.to_string(),
            limit: MAX_XML_ENTRY_BYTES,
        });
    }
    Ok(Some(out))
}

fn xml_error(entry: &str, e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Xml {
        entry: entry.to_string(),
        message: e.to_string(),
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Resolve the first `<sheet>` of the workbook through its relationship
/// id. Falls back to the lowest-numbered `sheetN.xml` when the workbook
/// parts are missing or unhelpful.
fn first_sheet_path(archive: &mut Archive<'_>) -> Result<String, DecodeError> {
    if let Some(path) = sheet_path_from_workbook(archive)? {
        if archive.file_names().any(|n| n == path) {
            return Ok(path);
        }
    }
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names.into_iter().next().ok_or(DecodeError::MissingWorksheet)
}

fn sheet_path_from_workbook(archive: &mut Archive<'_>) -> Result<Option<String>, DecodeError> {
    const WORKBOOK: &str = "xl/workbook.xml";
    const RELS: &str = "xl/_rels/workbook.xml.rels";

    let Some(workbook) = read_optional_entry(archive, WORKBOOK)? else {
        return Ok(None);
    };
    let mut rel_id = None;
    let mut reader = quick_xml::Reader::from_reader(workbook.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                rel_id = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                break;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(WORKBOOK, e)),
            _ => {}
        }
        buf.clear();
    }
    let Some(rel_id) = rel_id else {
        return Ok(None);
    };

    let Some(rels) = read_optional_entry(archive, RELS)? else {
        return Ok(None);
    };
    let mut reader = quick_xml::Reader::from_reader(rels.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship"
                    && attr(&e, b"Id").as_deref() == Some(rel_id.as_str()) =>
            {
                return Ok(attr(&e, b"Target").map(|target| match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target),
                }));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error(RELS, e)),
            _ => {}
        }
        buf.clear();
    }
}

/// Shared string table. Rich-text entries are the concatenation of their
/// runs; phonetic readings are dropped.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, DecodeError> {
    const ENTRY: &str = "xl/sharedStrings.xml";
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    let mut phonetic_depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    current = Some(String::new());
                    phonetic_depth = 0;
                }
                b"t" => in_t = current.is_some() && phonetic_depth == 0,
                PHONETIC_RUN => phonetic_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(te.unescape().map_err(|e| xml_error(ENTRY, e))?.as_ref());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                PHONETIC_RUN => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(ENTRY, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// One non-empty cell: zero-based column plus its typed value.
type SheetRow = Vec<(usize, Value)>;

#[derive(Default)]
struct CellState {
    column: usize,
    kind: Option<String>,
    raw: String,
    inline: String,
    in_v: bool,
    in_inline_t: bool,
    phonetic_depth: usize,
}

fn parse_sheet(xml: &[u8], entry: &str, shared: &[String]) -> Result<Vec<SheetRow>, DecodeError> {
    let mut rows = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut row: Option<SheetRow> = None;
    let mut cell: Option<CellState> = None;
    let mut next_column = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = Some(Vec::new());
                    next_column = 0;
                }
                b"c" => {
                    let column = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_column);
                    next_column = column + 1;
                    cell = Some(CellState {
                        column,
                        kind: attr(&e, b"t"),
                        ..CellState::default()
                    });
                }
                b"v" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_v = true;
                    }
                }
                b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_inline_t = c.phonetic_depth == 0;
                    }
                }
                PHONETIC_RUN => {
                    if let Some(c) = cell.as_mut() {
                        c.phonetic_depth += 1;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => next_column = 0,
                b"c" => {
                    next_column = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_column)
                        + 1;
                }
                _ => {}
            },
            Ok(Event::Text(te)) => {
                if let Some(c) = cell.as_mut() {
                    if c.in_v || c.in_inline_t {
                        let text = te.unescape().map_err(|e| xml_error(entry, e))?;
                        if c.in_v {
                            c.raw.push_str(&text);
                        } else {
                            c.inline.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_v = false;
                    }
                }
                b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_inline_t = false;
                    }
                }
                PHONETIC_RUN => {
                    if let Some(c) = cell.as_mut() {
                        c.phonetic_depth = c.phonetic_depth.saturating_sub(1);
                    }
                }
                b"c" => {
                    if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                        let column = c.column;
                        if let Some(value) = cell_value(c, shared) {
                            r.push((column, value));
                        }
                    }
                }
                b"row" => {
                    if let Some(r) = row.take() {
                        if !r.is_empty() {
                            rows.push(r);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(entry, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn cell_value(cell: CellState, shared: &[String]) -> Option<Value> {
    let raw = cell.raw.trim();
    let value = match cell.kind.as_deref() {
        Some("s") => {
            let text = raw.parse::<usize>().ok().and_then(|i| shared.get(i))?;
            Value::String(text.clone())
        }
        Some("inlineStr") => Value::String(cell.inline),
        Some("b") => Value::Bool(raw == "1"),
        Some("str") | Some("e") => Value::String(cell.raw),
        _ => {
            if raw.is_empty() {
                return None;
            }
            number_value(raw)
        }
    };
    match &value {
        Value::String(s) if s.trim().is_empty() => None,
        _ => Some(value),
    }
}

/// Integers stay integers; other numerics become floats. Unparseable
/// numeric cells are kept as their raw text.
fn number_value(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Zero-based column of an A1-style reference: `A1` is 0, `AA7` is 26.
fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: Vec<u8> = cell_ref
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for b in letters {
        index = index.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)?;
    }
    Some(index - 1)
}

/// Turn positioned cells into header-keyed rows. Columns without header
/// text get `__EMPTY`, and repeated headers get `_1`, `_2`, ... suffixes.
fn rows_from_cells(rows: Vec<SheetRow>, max_rows: usize) -> Vec<Row> {
    let mut iter = rows.into_iter();
    let Some(header_row) = iter.next() else {
        return Vec::new();
    };
    let data: Vec<SheetRow> = iter.collect();

    let columns = header_row
        .iter()
        .chain(data.iter().flatten())
        .map(|(col, _)| *col);
    let (Some(first), Some(last)) = (columns.clone().min(), columns.max()) else {
        return Vec::new();
    };

    let header_text: HashMap<usize, String> = header_row
        .iter()
        .map(|(col, value)| (*col, value_text(value).trim().to_string()))
        .filter(|(_, text)| !text.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut headers: HashMap<usize, String> = HashMap::new();
    for col in first..=last {
        let base = header_text
            .get(&col)
            .cloned()
            .unwrap_or_else(|| EMPTY_HEADER.to_string());
        headers.insert(col, unique_header(base, &mut seen));
    }

    let total = data.len();
    if total > max_rows {
        warn!(max_rows, total, "row limit reached, ignoring remaining rows");
    }
    data.into_iter()
        .take(max_rows)
        .map(|cells| {
            cells
                .into_iter()
                .filter_map(|(col, value)| headers.get(&col).map(|h| (h.clone(), value)))
                .collect::<Row>()
        })
        .collect()
}

fn unique_header(base: String, seen: &mut HashSet<String>) -> String {
    let mut name = base.clone();
    let mut suffix = 0;
    while seen.contains(&name) {
        suffix += 1;
        name = format!("{}_{}", base, suffix);
    }
    seen.insert(name.clone());
    name
}
