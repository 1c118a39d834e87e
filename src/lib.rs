pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{HttpImportGateway, LocalFileSource};
pub use crate::core::session::ImportSession;
pub use crate::core::sheet::DelimiterPolicy;
pub use crate::core::validator::{CatalogValidator, ValidatedImport, ValidatorOptions};
pub use domain::model::{ImportFile, ImportProgress, ImportRow, ImportSummary, ProductGroup};
pub use utils::error::{ImportError, Result};
