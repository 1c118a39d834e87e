use crate::core::format::{detect_format, mime_for_format};
use crate::domain::model::{ImportFile, ImportProgress, ImportRow, ImportSummary, ProductGroup};
use crate::domain::ports::{ConfigProvider, ImportGateway, ImportMode};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_IMPORT_PATH: &str = "/products/import";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the catalog backend's product endpoints.
pub struct HttpImportGateway {
    client: Client,
    base_url: String,
    import_path: String,
    token: Option<String>,
    timeout: Duration,
    mode: ImportMode,
}

impl HttpImportGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            import_path: DEFAULT_IMPORT_PATH.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            mode: ImportMode::default(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        validate_url("backend.base_url", config.base_url())?;

        let mut gateway = Self::new(config.base_url())
            .with_import_path(config.import_path())
            .with_timeout(config.request_timeout())
            .with_mode(config.import_mode());
        if let Some(token) = config.auth_token() {
            gateway = gateway.with_token(token);
        }
        Ok(gateway)
    }

    pub fn with_import_path(mut self, path: impl Into<String>) -> Self {
        self.import_path = path.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(self.endpoint(path)).timeout(self.timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn upload(&self, file: &ImportFile) -> Result<ImportSummary> {
        let format = detect_format(file)?;
        let part = Part::bytes(file.content.to_vec())
            .file_name(file.name.clone())
            .mime_str(mime_for_format(format))?;
        let form = Form::new().part("file", part);

        tracing::debug!("Uploading '{}' to {}", file.name, self.endpoint(&self.import_path));
        let response = self.post(&self.import_path).multipart(form).send().await?;
        tracing::debug!("Import response status: {}", response.status());

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: Value = response.json().await?;
        let summary = match body.get("data") {
            Some(data) if data.is_object() => serde_json::from_value(data.clone())?,
            _ => serde_json::from_value(body)?,
        };
        Ok(summary)
    }

    async fn create_products(
        &self,
        groups: &[ProductGroup],
        progress: &mut ImportProgress,
    ) -> Result<ImportSummary> {
        if !progress.is_empty() {
            tracing::info!(
                "Resuming import: {} products, {} variants already created",
                progress.totals().products_created,
                progress.totals().variants_created
            );
        }

        for group in groups {
            let existing = progress.product_id(&group.key).map(str::to_string);
            let product_id = match existing {
                Some(id) => id,
                None => {
                    let id = self.create_product(group).await.map_err(|e| {
                        tracing::warn!(
                            "Stopped at product '{}' after {} products, {} variants",
                            group.key.name,
                            progress.totals().products_created,
                            progress.totals().variants_created
                        );
                        e.with_partial(progress.totals())
                    })?;
                    progress.record_product(group.key.clone(), id.clone());
                    id
                }
            };

            for row in group.variant_rows() {
                if progress.has_variant(row.line) {
                    continue;
                }
                let path = format!("/products/{}/variants", product_id);
                let response = self.post(&path).json(&variant_body(row)).send().await?;
                if !response.status().is_success() {
                    tracing::warn!(
                        "Variant on line {} rejected after {} products, {} variants",
                        row.line,
                        progress.totals().products_created,
                        progress.totals().variants_created
                    );
                    return Err(rejection(response).await.with_partial(progress.totals()));
                }
                progress.record_variant(row.line);
            }
        }

        let mut summary = progress.totals().clone();
        summary.message = Some(format!(
            "{} produk dan {} varian berhasil dibuat",
            summary.products_created, summary.variants_created
        ));
        Ok(summary)
    }

    /// Creates one product and returns its remote id.
    async fn create_product(&self, group: &ProductGroup) -> Result<String> {
        let product = json!({
            "category_id": loose_number(&group.key.category_id),
            "name": group.key.name,
            "description": group.key.description,
        });

        tracing::debug!("Creating product '{}'", group.key.name);
        let response = self.post("/products").json(&product).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let created: Value = response.json().await?;
        product_id(&created).ok_or_else(|| {
            ImportError::remote(Some(format!(
                "Respons pembuatan produk '{}' tidak berisi id",
                group.key.name
            )))
        })
    }
}

#[async_trait]
impl ImportGateway for HttpImportGateway {
    async fn import(
        &self,
        file: &ImportFile,
        groups: &[ProductGroup],
        progress: &mut ImportProgress,
    ) -> Result<ImportSummary> {
        match self.mode {
            ImportMode::Upload => self.upload(file).await,
            ImportMode::PerProduct => self.create_products(groups, progress).await,
        }
    }
}

/// Turns a non-2xx response into the error shown to the user.
async fn rejection(response: Response) -> ImportError {
    let status = response.status();
    let message = response.json::<Value>().await.ok().and_then(|body| {
        body.get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    tracing::debug!("Backend rejected import with {}: {:?}", status, message);
    ImportError::remote(message)
}

fn product_id(body: &Value) -> Option<String> {
    let id = body.get("id").or_else(|| body.pointer("/data/id"))?;
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn loose_number(value: &str) -> Value {
    value
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value))
}

fn variant_body(row: &ImportRow) -> Value {
    json!({
        "variant_name": row.variant_name,
        "price": row.price_value(),
        "stock": row.stock_value(),
        "image_url": row.image_url,
    })
}
