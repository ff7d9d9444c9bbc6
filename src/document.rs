//! Requirements document loading
//!
//! Flattens an uploaded tabular file into plain text for the generation
//! prompt. Delimited files and workbooks become one line per row, each cell
//! prefixed with its column header; text files pass through unchanged.

mod workbook;

use std::path::Path;
use thiserror::Error;

/// Why an uploaded document could not be used
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Unsupported file type '{0}'. Upload a CSV, TSV, XLSX, TXT or MD file.")]
    Unsupported(String),
    #[error("Could not read {file_name}: {reason}")]
    Malformed { file_name: String, reason: String },
    #[error("{0} contains no requirements")]
    Empty(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Delimited(char),
    Workbook,
    Text,
}

impl DocumentFormat {
    fn infer(file_name: &str) -> Result<Self, DocumentError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(Self::Delimited(',')),
            "tsv" | "tab" => Ok(Self::Delimited('\t')),
            "xlsx" => Ok(Self::Workbook),
            "txt" | "md" | "markdown" => Ok(Self::Text),
            "" => Err(DocumentError::Unsupported(file_name.to_string())),
            other => Err(DocumentError::Unsupported(format!(".{other}"))),
        }
    }
}

/// Parse an uploaded file into a flat text blob
pub fn load_document(file_name: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match DocumentFormat::infer(file_name)? {
        DocumentFormat::Workbook => {
            let rows =
                workbook::read_first_sheet(bytes).map_err(|e| DocumentError::Malformed {
                    file_name: file_name.to_string(),
                    reason: e.to_string(),
                })?;
            flatten_rows(rows)
        }
        DocumentFormat::Text => decode_text(file_name, bytes)?.trim().to_string(),
        DocumentFormat::Delimited(delimiter) => {
            let content = decode_text(file_name, bytes)?;
            flatten_rows(
                content
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| split_delimited_line(line, delimiter)),
            )
        }
    };

    if text.is_empty() {
        return Err(DocumentError::Empty(file_name.to_string()));
    }

    tracing::debug!(file_name, chars = text.len(), "Document loaded");
    Ok(text)
}

/// UTF-8 text without a leading byte order mark
fn decode_text<'a>(file_name: &str, bytes: &'a [u8]) -> Result<&'a str, DocumentError> {
    let content = std::str::from_utf8(bytes).map_err(|e| DocumentError::Malformed {
        file_name: file_name.to_string(),
        reason: format!("not valid UTF-8 ({e})"),
    })?;
    Ok(content.strip_prefix('\u{feff}').unwrap_or(content))
}

/// One line per data row: `Header: value; Header: value`.
///
/// The first row with any text is the header. Blank cells are skipped.
/// Cells beyond the header row are labelled by their 1-based column number.
fn flatten_rows(rows: impl IntoIterator<Item = Vec<String>>) -> String {
    let mut rows = rows
        .into_iter()
        .skip_while(|cells| cells.iter().all(String::is_empty));
    let Some(headers) = rows.next() else {
        return String::new();
    };

    rows.filter_map(|cells| {
        let pairs: Vec<String> = cells
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_empty())
            .map(|(idx, value)| match headers.get(idx) {
                Some(header) if !header.is_empty() => format!("{header}: {value}"),
                _ => format!("column {}: {value}", idx + 1),
            })
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn split_delimited_line(line: &str, delimiter: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
            continue;
        }

        if c == delimiter && !in_quotes {
            result.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }

    result.push(current.trim().to_string());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_passes_through() {
        let text = load_document("reqs.txt", b"Req1: login; Req2: logout\n").unwrap();
        assert_eq!(text, "Req1: login; Req2: logout");
    }

    #[test]
    fn test_csv_rows_are_labelled_by_header() {
        let csv = b"ID,Requirement,Priority\nReq1,User can log in,high\nReq2,User can log out,\n";
        let text = load_document("reqs.csv", csv).unwrap();
        assert_eq!(
            text,
            "ID: Req1; Requirement: User can log in; Priority: high\n\
             ID: Req2; Requirement: User can log out"
        );
    }

    #[test]
    fn test_quoted_cells_keep_delimiters() {
        let csv = b"ID,Text\nR1,\"Login, with \"\"remember me\"\"\"\n";
        let text = load_document("reqs.CSV", csv).unwrap();
        assert_eq!(text, "ID: R1; Text: Login, with \"remember me\"");
    }

    #[test]
    fn test_tsv_and_extra_columns() {
        let tsv = b"ID\tText\nR1\tLogin\textra\n";
        let text = load_document("reqs.tsv", tsv).unwrap();
        assert_eq!(text, "ID: R1; Text: Login; column 3: extra");
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let text = load_document("reqs.csv", "\u{feff}ID\nR1\n".as_bytes()).unwrap();
        assert_eq!(text, "ID: R1");
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let err = load_document("reqs.csv", b"ID,Text\n").unwrap_err();
        assert_eq!(err, DocumentError::Empty("reqs.csv".to_string()));
    }

    #[test]
    fn test_unknown_binary_is_unsupported() {
        let err = load_document("reqs.pdf", b"%PDF-1.7").unwrap_err();
        assert_eq!(err, DocumentError::Unsupported(".pdf".to_string()));
        assert!(err.to_string().contains("XLSX"));
    }

    #[test]
    fn test_workbook_rows_are_labelled_by_header() {
        let bytes = workbook::tests::workbook(&[
            (
                "xl/sharedStrings.xml",
                "<sst><si><t>ID</t></si><si><t>Requirement</t></si><si><t>User can log in</t></si></sst>",
            ),
            (
                "xl/worksheets/sheet1.xml",
                "<worksheet><sheetData>\
                 <row r='1'><c r='A1' t='s'><v>0</v></c><c r='B1' t='s'><v>1</v></c></row>\
                 <row r='2'><c r='A2' t='inlineStr'><is><t>Req1</t></is></c><c r='B2' t='s'><v>2</v></c></row>\
                 <row r='3'><c r='B3'><v>42</v></c></row>\
                 </sheetData></worksheet>",
            ),
        ]);

        let text = load_document("Requirements.XLSX", &bytes).unwrap();

        assert_eq!(
            text,
            "ID: Req1; Requirement: User can log in\nRequirement: 42"
        );
    }

    #[test]
    fn test_corrupt_workbook_is_malformed() {
        let err = load_document("reqs.xlsx", b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { ref file_name, .. } if file_name == "reqs.xlsx"));
    }

    #[test]
    fn test_empty_workbook_sheet_is_empty() {
        let bytes = workbook::tests::workbook(&[(
            "xl/worksheets/sheet1.xml",
            "<worksheet><sheetData/></worksheet>",
        )]);
        let err = load_document("reqs.xlsx", &bytes).unwrap_err();
        assert_eq!(err, DocumentError::Empty("reqs.xlsx".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = load_document("reqs.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { .. }));
    }
}
