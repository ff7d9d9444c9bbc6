//! Spreadsheet (.xlsx) reading
//!
//! Only the first worksheet is read. Cell values come from the shared
//! string table, inline strings, or the raw `<v>` text for numbers.

use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use thiserror::Error;
use zip::ZipArchive;

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const SHEET_PREFIX: &str = "xl/worksheets/sheet";

static STRING_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<si\b[^>]*>(.*?)</si>").expect("valid pattern"));
static TEXT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").expect("valid pattern"));
static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<row\b[^>]*?(?:/>|>(.*?)</row>)").expect("valid pattern"));
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").expect("valid pattern"));
static CELL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\br=["']([A-Z]{1,3})\d+["']"#).expect("valid pattern"));
static CELL_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bt=["'](\w+)["']"#).expect("valid pattern"));
static VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<v>(.*?)</v>").expect("valid pattern"));

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("not a spreadsheet archive ({0})")]
    Archive(#[from] zip::result::ZipError),
    #[error("the workbook has no worksheet")]
    NoSheet,
    #[error("could not read {name} ({source})")]
    Entry {
        name: String,
        source: std::io::Error,
    },
}

/// Cell text of the first worksheet, row by row, in column order.
/// Missing cells inside a row are empty strings.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<String>>, WorkbookError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let sheet = first_sheet(&names).ok_or(WorkbookError::NoSheet)?;

    let shared = if names.iter().any(|name| name == SHARED_STRINGS) {
        parse_shared_strings(&read_entry(&mut archive, SHARED_STRINGS)?)
    } else {
        Vec::new()
    };
    let xml = read_entry(&mut archive, &sheet)?;
    Ok(parse_sheet(&xml, &shared))
}

/// `sheet1.xml` when present, otherwise the lowest-numbered sheet
fn first_sheet(names: &[String]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| {
            let number = name.strip_prefix(SHEET_PREFIX)?.strip_suffix(".xml")?;
            Some((number.parse::<u32>().unwrap_or(u32::MAX), name))
        })
        .min()
        .map(|(_, name)| name.clone())
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, WorkbookError> {
    let mut entry = archive.by_name(name)?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|source| WorkbookError::Entry {
            name: name.to_string(),
            source,
        })?;
    Ok(xml)
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    STRING_ITEM
        .captures_iter(xml)
        .map(|item| text_runs(&item[1]))
        .collect()
}

/// Concatenated `<t>` runs, so rich text reads as one string
fn text_runs(xml: &str) -> String {
    TEXT_RUN
        .captures_iter(xml)
        .map(|run| decode_entities(&run[1]))
        .collect()
}

fn parse_sheet(xml: &str, shared: &[String]) -> Vec<Vec<String>> {
    ROW.captures_iter(xml)
        .map(|row| {
            let body = row.get(1).map_or("", |m| m.as_str());
            let mut cells: Vec<String> = Vec::new();
            for cell in CELL.captures_iter(body) {
                let attrs = &cell[1];
                let content = cell.get(2).map_or("", |m| m.as_str());
                let column = CELL_REF
                    .captures(attrs)
                    .map_or(cells.len(), |r| column_index(&r[1]));
                let kind = CELL_TYPE.captures(attrs).map(|t| t[1].to_string());

                if cells.len() <= column {
                    cells.resize(column + 1, String::new());
                }
                cells[column] = cell_value(kind.as_deref(), content, shared);
            }
            cells
        })
        .collect()
}

fn cell_value(kind: Option<&str>, content: &str, shared: &[String]) -> String {
    if kind == Some("inlineStr") {
        return text_runs(content).trim().to_string();
    }

    let raw = VALUE
        .captures(content)
        .map(|v| decode_entities(&v[1]))
        .unwrap_or_default();
    if kind == Some("s") {
        raw.trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared.get(index))
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    } else {
        raw.trim().to_string()
    }
}

/// Zero-based index of a column name: `A` is 0, `Z` is 25, `AA` is 26
fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + usize::from(b - b'A') + 1)
        - 1
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
