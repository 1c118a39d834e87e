use crate::domain::model::ImportSummary;
use thiserror::Error;

/// Fallback shown when the backend rejects an import without a message.
pub const DEFAULT_REMOTE_FAILURE: &str = "Gagal mengimpor produk";

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Format file tidak didukung: {file_name}. Gunakan file CSV, XLS, atau XLSX")]
    UnsupportedFormat { file_name: String },

    #[error("Header tidak valid: {header}")]
    InvalidHeader { header: String },

    #[error("Isi file tidak valid pada baris {line}")]
    InvalidRow { line: usize },

    #[error("Isi file tidak valid")]
    EmptyContent,

    /// `message` carries the reader's detail for logs; users only see the generic text.
    #[error("Gagal membaca file")]
    ParseFailure { message: String },

    /// `partial` holds what was created before the rejection, if anything.
    #[error("{message}")]
    RemoteImportFailure {
        message: String,
        partial: Option<ImportSummary>,
    },

    #[error("Ukuran file melebihi batas {limit} byte ({size} byte)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Belum ada file yang dipilih")]
    NoFileSelected,

    #[error("Import sedang berjalan")]
    ImportInProgress,

    #[error("Import dibatalkan")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Remote,
    Session,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn remote(message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_REMOTE_FAILURE.to_string());
        ImportError::RemoteImportFailure {
            message,
            partial: None,
        }
    }

    /// Attaches the work done before a remote rejection. Other errors pass through.
    pub fn with_partial(self, summary: &ImportSummary) -> Self {
        match self {
            ImportError::RemoteImportFailure { message, .. }
                if summary.products_created > 0 || summary.variants_created > 0 =>
            {
                ImportError::RemoteImportFailure {
                    message,
                    partial: Some(summary.clone()),
                }
            }
            other => other,
        }
    }

    pub fn partial_summary(&self) -> Option<&ImportSummary> {
        match self {
            ImportError::RemoteImportFailure { partial, .. } => partial.as_ref(),
            _ => None,
        }
    }

    pub fn parse_failure(message: impl Into<String>) -> Self {
        ImportError::ParseFailure {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ImportError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::UnsupportedFormat { .. }
            | ImportError::InvalidHeader { .. }
            | ImportError::InvalidRow { .. }
            | ImportError::EmptyContent
            | ImportError::ParseFailure { .. }
            | ImportError::FileTooLarge { .. } => ErrorCategory::Validation,
            ImportError::RemoteImportFailure { .. } | ImportError::ApiError(_) => {
                ErrorCategory::Remote
            }
            ImportError::NoFileSelected | ImportError::ImportInProgress | ImportError::Cancelled => {
                ErrorCategory::Session
            }
            ImportError::ConfigError { .. } | ImportError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ImportError::IoError(_) | ImportError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether the same file can be submitted again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Remote | ErrorCategory::Session)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::ApiError(e) if e.is_timeout() => {
                "Server tidak merespons tepat waktu".to_string()
            }
            ImportError::ApiError(_) => DEFAULT_REMOTE_FAILURE.to_string(),
            ImportError::IoError(e) => format!("Gagal membaca file: {}", e),
            ImportError::SerializationError(_) => {
                "Respons server tidak dapat dibaca".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::UnsupportedFormat { .. } => "Upload a .csv, .xls or .xlsx file",
            ImportError::InvalidHeader { .. } => {
                "Use only: category_id, name, description, variant_name, price, stock, image_url"
            }
            ImportError::InvalidRow { .. } => {
                "Fill in category_id and name on the reported line"
            }
            ImportError::EmptyContent => "Add a header row and at least one product row",
            ImportError::ParseFailure { .. } => "Re-export the spreadsheet and try again",
            ImportError::FileTooLarge { .. } => "Split the catalog into smaller files",
            ImportError::RemoteImportFailure { .. } | ImportError::ApiError(_) => {
                "Check the backend status and submit the same file again"
            }
            ImportError::NoFileSelected => "Select a file first",
            ImportError::ImportInProgress => "Wait for the running import to finish",
            ImportError::Cancelled => "Submit again if the import is still needed",
            ImportError::ConfigError { .. } | ImportError::InvalidConfigValueError { .. } => {
                "Check the configuration file and flags"
            }
            ImportError::IoError(_) => "Check that the file exists and is readable",
            ImportError::SerializationError(_) => "Check the backend response format",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ImportError::InvalidHeader {
                header: "bogus_field".to_string()
            }
            .to_string(),
            "Header tidak valid: bogus_field"
        );
        assert_eq!(
            ImportError::InvalidRow { line: 3 }.to_string(),
            "Isi file tidak valid pada baris 3"
        );
        assert_eq!(ImportError::EmptyContent.to_string(), "Isi file tidak valid");
    }

    #[test]
    fn test_parse_failure_hides_reader_detail() {
        let err = ImportError::parse_failure("Zip error: invalid Zip archive: Could not find EOCD");
        assert_eq!(err.to_string(), "Gagal membaca file");
        assert_eq!(err.user_friendly_message(), "Gagal membaca file");
        assert!(format!("{:?}", err).contains("EOCD"));
    }

    #[test]
    fn test_remote_message_fallback() {
        assert_eq!(ImportError::remote(None).to_string(), DEFAULT_REMOTE_FAILURE);
        assert_eq!(
            ImportError::remote(Some("   ".to_string())).to_string(),
            DEFAULT_REMOTE_FAILURE
        );
        assert_eq!(
            ImportError::remote(Some("Kategori tidak ditemukan".to_string())).to_string(),
            "Kategori tidak ditemukan"
        );
    }

    #[test]
    fn test_partial_summary_keeps_message() {
        let created = ImportSummary {
            products_created: 1,
            variants_created: 2,
            ..Default::default()
        };

        let err = ImportError::remote(Some("Kategori 2 tidak ditemukan".to_string()))
            .with_partial(&created);
        assert_eq!(err.to_string(), "Kategori 2 tidak ditemukan");
        assert_eq!(err.partial_summary(), Some(&created));

        let nothing = ImportError::remote(None).with_partial(&ImportSummary::default());
        assert_eq!(nothing.partial_summary(), None);

        assert!(ImportError::EmptyContent.with_partial(&created).partial_summary().is_none());
    }

    #[test]
    fn test_severity_and_retry() {
        let remote = ImportError::remote(None);
        assert_eq!(remote.category(), ErrorCategory::Remote);
        assert_eq!(remote.severity(), ErrorSeverity::Medium);
        assert!(remote.is_retryable());

        let header = ImportError::InvalidHeader {
            header: "x".to_string(),
        };
        assert_eq!(header.severity(), ErrorSeverity::High);
        assert!(!header.is_retryable());
    }
}
