use crate::domain::model::{ImportFile, ImportProgress, ImportSummary, ProductGroup};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Where selected files come from.
pub trait FileSource: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<ImportFile>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Send the original file; the backend parses it again.
    #[default]
    Upload,
    /// Create each product, then add its variants one call at a time.
    PerProduct,
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn import_path(&self) -> &str;
    fn auth_token(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn import_mode(&self) -> ImportMode;
}

/// The remote import operation. Called only after validation succeeded.
///
/// `progress` starts with whatever an earlier failed attempt on the same
/// selection created; gateways that create records one by one record into it
/// and skip what is already there.
#[async_trait]
pub trait ImportGateway: Send + Sync {
    async fn import(
        &self,
        file: &ImportFile,
        groups: &[ProductGroup],
        progress: &mut ImportProgress,
    ) -> Result<ImportSummary>;
}

#[async_trait]
impl<G: ImportGateway + ?Sized> ImportGateway for std::sync::Arc<G> {
    async fn import(
        &self,
        file: &ImportFile,
        groups: &[ProductGroup],
        progress: &mut ImportProgress,
    ) -> Result<ImportSummary> {
        (**self).import(file, groups, progress).await
    }
}
