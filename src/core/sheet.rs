//! Turns raw file bytes into a grid of string cells.
//!
//! Every row keeps the physical, 1-indexed line (CSV) or row (spreadsheet)
//! it came from so validation errors can point at the exact place in the file.

use crate::domain::model::FileFormat;
use crate::utils::error::{ImportError, Result};
use calamine::{open_workbook_auto_from_rs, Reader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// How CSV columns are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterPolicy {
    /// Split every line on both `,` and `;`, no quoting. Matches what the
    /// storefront admin has always accepted, including mixed separators.
    #[default]
    Lenient,
    /// Quote-aware parsing with a single delimiter detected from the header line.
    Rfc4180,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub rows: Vec<SheetRow>,
}

pub fn read_sheet(format: FileFormat, content: &[u8], policy: DelimiterPolicy) -> Result<Sheet> {
    match format {
        FileFormat::Csv => {
            let text = decode_text(content);
            match policy {
                DelimiterPolicy::Lenient => Ok(split_lenient(&text)),
                DelimiterPolicy::Rfc4180 => read_rfc4180(&text),
            }
        }
        FileFormat::Xls | FileFormat::Xlsx => read_workbook(content),
    }
}

fn decode_text(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

fn split_lenient(text: &str) -> Sheet {
    let rows = text
        .lines()
        .enumerate()
        .map(|(idx, line)| SheetRow {
            line: idx + 1,
            cells: line
                .split([',', ';'])
                .map(|cell| cell.trim().to_string())
                .collect(),
        })
        .collect();

    Sheet { rows }
}

/// Picks `;` when the header line has more of them than commas.
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|line| !line.trim().is_empty()).unwrap_or_default();
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn read_rfc4180(text: &str) -> Result<Sheet> {
    let delimiter = detect_delimiter(text);
    tracing::debug!("Reading CSV with delimiter '{}'", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(unreadable)?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(rows.len() + 1);
        rows.push(SheetRow {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(Sheet { rows })
}

fn unreadable(error: impl std::fmt::Display) -> ImportError {
    tracing::warn!("Could not read file content: {}", error);
    ImportError::parse_failure(error.to_string())
}

fn read_workbook(content: &[u8]) -> Result<Sheet> {
    let cursor = Cursor::new(content.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(unreadable)?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(unreadable)?,
        None => return Ok(Sheet::default()),
    };

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let rows = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| SheetRow {
            line: first_row + idx + 1,
            cells: cells.iter().map(|cell| cell.to_string()).collect(),
        })
        .collect();

    Ok(Sheet { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(sheet: &Sheet, idx: usize) -> Vec<&str> {
        sheet.rows[idx].cells.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_lenient_split_mixed_delimiters_and_crlf() {
        let text = "category_id;name,description\r\n1;Widget,A basic widget\r\n";
        let sheet = read_sheet(FileFormat::Csv, text.as_bytes(), DelimiterPolicy::Lenient).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(cells(&sheet, 0), vec!["category_id", "name", "description"]);
        assert_eq!(cells(&sheet, 1), vec!["1", "Widget", "A basic widget"]);
        assert_eq!(sheet.rows[1].line, 2);
    }

    #[test]
    fn test_lenient_split_breaks_quoted_values() {
        let text = "name,description\nWidget,\"Small, blue\"\n";
        let sheet = read_sheet(FileFormat::Csv, text.as_bytes(), DelimiterPolicy::Lenient).unwrap();

        assert_eq!(sheet.rows[1].cells.len(), 3);
    }

    #[test]
    fn test_rfc4180_keeps_quoted_values() {
        let text = "name,description\nWidget,\"Small, blue\"\n";
        let sheet = read_sheet(FileFormat::Csv, text.as_bytes(), DelimiterPolicy::Rfc4180).unwrap();

        assert_eq!(cells(&sheet, 1), vec!["Widget", "Small, blue"]);
        assert_eq!(sheet.rows[1].line, 2);
    }

    #[test]
    fn test_rfc4180_detects_semicolon() {
        let text = "category_id;name;price\n1;Widget;12,50\n";
        let sheet = read_sheet(FileFormat::Csv, text.as_bytes(), DelimiterPolicy::Rfc4180).unwrap();

        assert_eq!(cells(&sheet, 1), vec!["1", "Widget", "12,50"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"name\nWidget\n");
        let sheet = read_sheet(FileFormat::Csv, &bytes, DelimiterPolicy::Lenient).unwrap();

        assert_eq!(cells(&sheet, 0), vec!["name"]);
    }

    #[test]
    fn test_blank_row_detection() {
        let text = "name\n ; , \n";
        let sheet = read_sheet(FileFormat::Csv, text.as_bytes(), DelimiterPolicy::Lenient).unwrap();

        assert!(!sheet.rows[0].is_blank());
        assert!(sheet.rows[1].is_blank());
    }

    #[test]
    fn test_corrupt_workbook_is_parse_failure() {
        let err = read_sheet(FileFormat::Xlsx, b"definitely not a zip", DelimiterPolicy::Lenient)
            .unwrap_err();
        assert!(matches!(err, ImportError::ParseFailure { .. }));
    }
}
