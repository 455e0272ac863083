use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// A per-size stock counter.
///
/// Labels are trimmed and case-sensitive ("M" and "m" are distinct sizes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SizeStock {
    /// Size label
    #[serde(alias = "size")]
    pub label: String,
    /// Units on hand
    pub quantity: u32,
}

/// Product entity - one document per article, holding its per-size stock.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Business identity for stock operations; unique and immutable
    pub product_code: String,
    /// Display name
    pub product_name: String,
    /// Brand name
    #[serde(default)]
    pub brand: String,
    /// Color of this article
    pub color: String,
    /// Per-size stock counters; no two entries share a label
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Normalize a size list: trim labels, drop empty ones, merge duplicate
/// labels by summing their quantities. The first occurrence of each label
/// keeps its position.
///
/// Every write path runs its sizes through this, so stored products never
/// carry duplicate labels.
pub fn coalesce_sizes(entries: Vec<SizeStock>) -> Vec<SizeStock> {
    let mut out: Vec<SizeStock> = Vec::with_capacity(entries.len());

    for entry in entries {
        let label = entry.label.trim();
        if label.is_empty() {
            continue;
        }
        match out.iter_mut().find(|s| s.label == label) {
            Some(existing) => existing.quantity += entry.quantity,
            None => out.push(SizeStock {
                label: label.to_string(),
                quantity: entry.quantity,
            }),
        }
    }

    out
}

/// Accepted wire shapes for a product's sizes.
///
/// Clients may send either a list of `{size, quantity}` entries or a
/// `{label: quantity}` object; both normalize to the same `Vec<SizeStock>`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SizesInput {
    /// `[{"size": "M", "quantity": 3}, ...]`
    Entries(Vec<SizeStock>),
    /// `{"M": 3, "L": 1}`
    Map(BTreeMap<String, u32>),
}

impl SizesInput {
    /// Convert to the normalized internal representation.
    pub fn into_sizes(self) -> Vec<SizeStock> {
        let entries = match self {
            SizesInput::Entries(entries) => entries,
            SizesInput::Map(map) => map
                .into_iter()
                .map(|(label, quantity)| SizeStock { label, quantity })
                .collect(),
        };
        coalesce_sizes(entries)
    }
}

impl Default for SizesInput {
    fn default() -> Self {
        SizesInput::Entries(Vec::new())
    }
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 100))]
    pub product_code: String,
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[serde(default)]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub color: String,
    #[serde(default)]
    pub sizes: SizesInput,
}

/// DTO for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub product_name: Option<String>,
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub color: Option<String>,
    /// Replaces the whole size map (normalized)
    pub sizes: Option<SizesInput>,
}

/// Query filters for listing products
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    /// Case-insensitive substring match across code, name, brand and color
    pub search: Option<String>,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl ProductFilter {
    /// Number of documents to skip for the requested page.
    pub fn offset(&self) -> u64 {
        let page = self.page.max(1);
        (page - 1) * self.limit.max(0) as u64
    }
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl Product {
    /// Create a new product from CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            product_code: input.product_code.trim().to_string(),
            product_name: input.product_name.trim().to_string(),
            brand: input.brand.trim().to_string(),
            color: input.color.trim().to_string(),
            sizes: input.sizes.into_sizes(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.product_name {
            self.product_name = name.trim().to_string();
        }
        if let Some(brand) = update.brand {
            self.brand = brand.trim().to_string();
        }
        if let Some(color) = update.color {
            self.color = color.trim().to_string();
        }
        if let Some(sizes) = update.sizes {
            self.sizes = sizes.into_sizes();
        }
        self.updated_at = Utc::now();
    }

    /// Quantity on hand for a size label, 0 when the label is absent.
    pub fn quantity_for(&self, label: &str) -> u32 {
        self.sizes
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    /// Total units across all sizes.
    pub fn total_quantity(&self) -> u32 {
        self.sizes.iter().map(|s| s.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn size(label: &str, quantity: u32) -> SizeStock {
        SizeStock {
            label: label.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_coalesce_merges_duplicates_by_sum() {
        let sizes = coalesce_sizes(vec![size("M", 2), size("L", 1), size("M", 3)]);
        assert_eq!(sizes, vec![size("M", 5), size("L", 1)]);
    }

    #[test]
    fn test_coalesce_trims_and_drops_empty_labels() {
        let sizes = coalesce_sizes(vec![size("  M ", 2), size("   ", 7), size("M", 1)]);
        assert_eq!(sizes, vec![size("M", 3)]);
    }

    #[test]
    fn test_coalesce_is_case_sensitive() {
        let sizes = coalesce_sizes(vec![size("m", 1), size("M", 1)]);
        assert_eq!(sizes.len(), 2);
    }

    #[test]
    fn test_sizes_input_accepts_list() {
        let input: SizesInput =
            serde_json::from_value(json!([{"size": "M", "quantity": 3}])).unwrap();
        assert_eq!(input.into_sizes(), vec![size("M", 3)]);
    }

    #[test]
    fn test_sizes_input_accepts_map() {
        let input: SizesInput = serde_json::from_value(json!({"M": 3, "L": 1})).unwrap();
        let sizes = input.into_sizes();
        assert!(sizes.contains(&size("M", 3)));
        assert!(sizes.contains(&size("L", 1)));
    }

    #[test]
    fn test_new_product_normalizes_fields() {
        let product = Product::new(CreateProduct {
            product_code: " SKU-1 ".to_string(),
            product_name: "Shirt".to_string(),
            brand: String::new(),
            color: "Blue".to_string(),
            sizes: SizesInput::Entries(vec![size("M", 1), size("M", 2)]),
        });
        assert_eq!(product.product_code, "SKU-1");
        assert_eq!(product.sizes, vec![size("M", 3)]);
    }

    #[test]
    fn test_update_replaces_size_map() {
        let mut product = Product::new(CreateProduct {
            product_code: "SKU-1".to_string(),
            product_name: "Shirt".to_string(),
            brand: String::new(),
            color: "Blue".to_string(),
            sizes: SizesInput::Entries(vec![size("M", 5)]),
        });
        product.apply_update(UpdateProduct {
            sizes: Some(SizesInput::Entries(vec![size("L", 2)])),
            ..Default::default()
        });
        assert_eq!(product.sizes, vec![size("L", 2)]);
        assert_eq!(product.quantity_for("M"), 0);
    }

    #[test]
    fn test_filter_offset() {
        let filter = ProductFilter {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 40);
        let first = ProductFilter::default();
        assert_eq!(first.offset(), 0);
    }
}
