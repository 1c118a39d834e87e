pub mod format;
pub mod session;
pub mod sheet;
pub mod validator;

pub use crate::domain::model::{FileFormat, ImportFile, ImportRow, ImportSummary, ProductGroup};
pub use crate::domain::ports::{ConfigProvider, FileSource, ImportGateway, ImportMode};
pub use crate::utils::error::Result;
