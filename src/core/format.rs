use crate::domain::model::{FileFormat, ImportFile};
use crate::utils::error::{ImportError, Result};

pub const MIME_CSV: &str = "text/csv";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xls", "xlsx"];

pub fn format_from_extension(extension: &str) -> Option<FileFormat> {
    match extension.to_ascii_lowercase().as_str() {
        "csv" => Some(FileFormat::Csv),
        "xls" => Some(FileFormat::Xls),
        "xlsx" => Some(FileFormat::Xlsx),
        _ => None,
    }
}

pub fn format_from_mime(mime_type: &str) -> Option<FileFormat> {
    // Parameters such as "; charset=utf-8" do not change the format.
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        MIME_CSV => Some(FileFormat::Csv),
        MIME_XLS => Some(FileFormat::Xls),
        MIME_XLSX => Some(FileFormat::Xlsx),
        _ => None,
    }
}

pub fn mime_for_format(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Csv => MIME_CSV,
        FileFormat::Xls => MIME_XLS,
        FileFormat::Xlsx => MIME_XLSX,
    }
}

/// MIME type to declare for a file picked up from disk by name.
pub fn guess_mime(file_name: &str) -> &'static str {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(format_from_extension)
        .map(mime_for_format)
        .unwrap_or("application/octet-stream")
}

/// Accepts the file when either its extension or its declared MIME type is known.
/// The extension decides the parser; the MIME type is only consulted without one.
pub fn detect_format(file: &ImportFile) -> Result<FileFormat> {
    file.extension()
        .as_deref()
        .and_then(format_from_extension)
        .or_else(|| format_from_mime(&file.mime_type))
        .ok_or_else(|| ImportError::UnsupportedFormat {
            file_name: file.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str) -> ImportFile {
        ImportFile::new(name, mime, Vec::new())
    }

    #[test]
    fn test_extension_wins_over_mime() {
        assert_eq!(
            detect_format(&file("catalog.xlsx", MIME_CSV)).unwrap(),
            FileFormat::Xlsx
        );
        assert_eq!(
            detect_format(&file("CATALOG.CSV", "application/octet-stream")).unwrap(),
            FileFormat::Csv
        );
    }

    #[test]
    fn test_mime_fallback_when_extension_unknown() {
        assert_eq!(
            detect_format(&file("export", MIME_XLS)).unwrap(),
            FileFormat::Xls
        );
        assert_eq!(
            detect_format(&file("export.dat", "text/csv; charset=utf-8")).unwrap(),
            FileFormat::Csv
        );
    }

    #[test]
    fn test_unknown_extension_and_mime_rejected() {
        for (name, mime) in [
            ("catalog.txt", "text/plain"),
            ("catalog.pdf", "application/pdf"),
            ("catalog", ""),
            ("catalog.json", "application/json"),
        ] {
            let err = detect_format(&file(name, mime)).unwrap_err();
            assert!(
                matches!(err, ImportError::UnsupportedFormat { ref file_name } if file_name == name),
                "unexpected error for {}: {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("a.csv"), MIME_CSV);
        assert_eq!(guess_mime("a.XLS"), MIME_XLS);
        assert_eq!(guess_mime("a.xlsx"), MIME_XLSX);
        assert_eq!(guess_mime("a.txt"), "application/octet-stream");
    }
}
