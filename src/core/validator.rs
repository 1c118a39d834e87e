use crate::core::format::detect_format;
use crate::core::sheet::{read_sheet, DelimiterPolicy, Sheet};
use crate::domain::model::{
    FileFormat, ImportFile, ImportRow, ProductGroup, ProductKey, ALLOWED_COLUMNS,
};
use crate::utils::error::{ImportError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    pub delimiter_policy: DelimiterPolicy,
    /// Rejects larger files up front. `None` leaves the size unchecked.
    pub max_file_size: Option<u64>,
}

/// A file that passed every check and is ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedImport {
    pub format: FileFormat,
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
    pub groups: Vec<ProductGroup>,
}

impl ValidatedImport {
    pub fn variant_count(&self) -> usize {
        self.groups.iter().map(|g| g.variant_rows().count()).sum()
    }
}

/// Lowercases and joins whitespace runs with `_`: `" Category  ID "` becomes `category_id`.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Buckets rows by category, name and description in first-seen order.
pub fn group_rows(rows: &[ImportRow]) -> Vec<ProductGroup> {
    let mut index: HashMap<ProductKey, usize> = HashMap::new();
    let mut groups: Vec<ProductGroup> = Vec::new();

    for row in rows {
        let key = row.group_key();
        if let Some(&pos) = index.get(&key) {
            groups[pos].rows.push(row.clone());
            continue;
        }
        index.insert(key.clone(), groups.len());
        groups.push(ProductGroup {
            key,
            rows: vec![row.clone()],
        });
    }

    groups
}

#[derive(Debug, Clone, Default)]
pub struct CatalogValidator {
    options: ValidatorOptions,
}

impl CatalogValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn validate(&self, file: &ImportFile) -> Result<ValidatedImport> {
        self.validate_with(file, |_| {})
    }

    /// Same as [`validate`](Self::validate), calling `on_row` with the line of
    /// every data row as it is evaluated.
    pub fn validate_with<F>(&self, file: &ImportFile, on_row: F) -> Result<ValidatedImport>
    where
        F: FnMut(usize),
    {
        let format = detect_format(file)?;

        if let Some(limit) = self.options.max_file_size {
            if file.size() > limit {
                return Err(ImportError::FileTooLarge {
                    size: file.size(),
                    limit,
                });
            }
        }

        let sheet = read_sheet(format, &file.content, self.options.delimiter_policy)?;
        let (headers, rows) = scan_sheet(&sheet, on_row)?;
        let groups = group_rows(&rows);

        tracing::debug!(
            "Validated '{}': {} rows, {} products",
            file.name,
            rows.len(),
            groups.len()
        );

        Ok(ValidatedImport {
            format,
            headers,
            rows,
            groups,
        })
    }
}

fn scan_sheet<F>(sheet: &Sheet, mut on_row: F) -> Result<(Vec<String>, Vec<ImportRow>)>
where
    F: FnMut(usize),
{
    let mut remaining = sheet.rows.iter().skip_while(|row| row.is_blank());

    let header_row = match remaining.next() {
        Some(row) => row,
        None => return Err(ImportError::EmptyContent),
    };

    let headers: Vec<String> = header_row.cells.iter().map(|h| normalize_header(h)).collect();
    if let Some(bad) = headers
        .iter()
        .find(|h| !h.is_empty() && !ALLOWED_COLUMNS.contains(&h.as_str()))
    {
        return Err(ImportError::InvalidHeader {
            header: bad.clone(),
        });
    }

    let mut rows = Vec::new();
    for sheet_row in remaining {
        if sheet_row.is_blank() {
            continue;
        }
        on_row(sheet_row.line);

        let columns: HashMap<&str, &str> = headers
            .iter()
            .zip(sheet_row.cells.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.as_str(), value.as_str()))
            .collect();

        let row = ImportRow::from_columns(sheet_row.line, &columns);
        if !row.has_required_fields() {
            return Err(ImportError::InvalidRow {
                line: sheet_row.line,
            });
        }
        rows.push(row);
    }

    if headers.iter().all(|h| h.is_empty()) || rows.is_empty() {
        return Err(ImportError::EmptyContent);
    }

    Ok((headers, rows))
}
