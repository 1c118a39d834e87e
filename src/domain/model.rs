use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Column names a catalog file may carry, in canonical order.
pub const ALLOWED_COLUMNS: [&str; 7] = [
    "category_id",
    "name",
    "description",
    "variant_name",
    "price",
    "stock",
    "image_url",
];

/// A user-selected file: declared name and MIME type plus its full content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub mime_type: String,
    pub content: Arc<[u8]>,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content: Vec<u8> = content.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: Arc::from(content),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Lower-cased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xls,
    Xlsx,
}

/// One product-or-variant record from one line of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(skip)]
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ImportRow {
    /// Builds a row from a column-name to value map. Empty values become `None`.
    pub fn from_columns(line: usize, columns: &HashMap<&str, &str>) -> Self {
        let take = |key: &str| {
            columns
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            line,
            category_id: take("category_id"),
            name: take("name"),
            description: take("description"),
            variant_name: take("variant_name"),
            price: take("price"),
            stock: take("stock"),
            image_url: take("image_url"),
        }
    }

    /// `category_id` and `name` must both be filled.
    pub fn has_required_fields(&self) -> bool {
        self.category_id.is_some() && self.name.is_some()
    }

    /// Whether the row describes a variant on top of its product fields.
    pub fn has_variant_data(&self) -> bool {
        self.variant_name.is_some()
            || self.price.is_some()
            || self.stock.is_some()
            || self.image_url.is_some()
    }

    pub fn group_key(&self) -> ProductKey {
        ProductKey {
            category_id: self.category_id.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
        }
    }

    pub fn price_value(&self) -> Option<f64> {
        self.price.as_deref().and_then(|p| p.replace(',', ".").parse().ok())
    }

    pub fn stock_value(&self) -> Option<i64> {
        let stock = self.stock.as_deref()?;
        stock
            .parse::<i64>()
            .ok()
            .or_else(|| stock.parse::<f64>().ok().filter(|v| v.fract() == 0.0).map(|v| v as i64))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub category_id: String,
    pub name: String,
    pub description: String,
}

/// Rows sharing the same category, name and description: one product with its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductGroup {
    pub key: ProductKey,
    pub rows: Vec<ImportRow>,
}

impl ProductGroup {
    pub fn variant_rows(&self) -> impl Iterator<Item = &ImportRow> {
        self.rows.iter().filter(|row| row.has_variant_data())
    }
}

/// Counters returned by the backend after an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "created_products")]
    pub products_created: u64,
    #[serde(default, rename = "created_variants")]
    pub variants_created: u64,
    #[serde(default)]
    pub updated_variants: u64,
}

/// What a per-product import already created for the current selection.
///
/// Kept by the session across a failed submit so the retry skips products and
/// variants the backend accepted the first time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportProgress {
    products: HashMap<ProductKey, String>,
    variant_lines: HashSet<usize>,
    totals: ImportSummary,
}

impl ImportProgress {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.variant_lines.is_empty()
    }

    /// Remote id of a product created by an earlier attempt.
    pub fn product_id(&self, key: &ProductKey) -> Option<&str> {
        self.products.get(key).map(String::as_str)
    }

    pub fn record_product(&mut self, key: ProductKey, id: String) {
        if self.products.insert(key, id).is_none() {
            self.totals.products_created += 1;
        }
    }

    pub fn has_variant(&self, line: usize) -> bool {
        self.variant_lines.contains(&line)
    }

    pub fn record_variant(&mut self, line: usize) {
        if self.variant_lines.insert(line) {
            self.totals.variants_created += 1;
        }
    }

    /// Counts over every attempt, not just the latest one.
    pub fn totals(&self) -> &ImportSummary {
        &self.totals
    }
}
