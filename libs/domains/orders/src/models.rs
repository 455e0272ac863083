use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// One sold line of a sale: a (product, size) pair with a quantity and the
/// color snapshotted at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaleLine {
    pub product_id: Uuid,
    pub product_code: String,
    pub size: String,
    pub quantity: u32,
    #[serde(default)]
    pub color: String,
}

/// Sale record - immutable once written. Corrections happen via `Return`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Sale {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub customer_name: String,
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub notes: String,
    /// Sum of line quantities, computed at commit
    pub total_items: u32,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(customer_name: String, items: Vec<SaleLine>, notes: String) -> Self {
        let total_items = items.iter().map(|line| line.quantity).sum();
        Self {
            id: Uuid::now_v7(),
            customer_name,
            items,
            notes,
            total_items,
            created_at: Utc::now(),
        }
    }

    /// Find the line matching a (code, size) pair. Inputs are expected
    /// already trimmed; stored lines are trimmed at creation.
    pub fn find_line(&self, product_code: &str, size: &str) -> Option<&SaleLine> {
        self.items
            .iter()
            .find(|line| line.product_code == product_code && line.size == size)
    }
}

/// Return record - stock credited back against a sale line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Return {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub sale_id: Uuid,
    pub customer_name: String,
    pub product_id: Uuid,
    pub product_code: String,
    pub size: String,
    pub quantity: u32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// One requested line of a sale, as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaleLineInput {
    pub product_code: String,
    pub size: String,
    pub quantity: u32,
    /// Optional; falls back to the product's color when blank
    #[serde(default)]
    pub color: String,
}

/// DTO for creating a sale
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSale {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 1))]
    pub items: Vec<SaleLineInput>,
    #[serde(default)]
    pub notes: String,
}

/// A `CreateSale` after trimming and per-line checks.
#[derive(Debug, Clone)]
pub struct NormalizedSale {
    pub customer_name: String,
    pub items: Vec<SaleLineInput>,
    pub notes: String,
}

impl CreateSale {
    /// Trim and check every field. Any bad line rejects the whole request,
    /// before any stock mutation.
    pub fn normalized(&self) -> Result<NormalizedSale, String> {
        let customer_name = self.customer_name.trim();
        if customer_name.is_empty() {
            return Err("customer_name must not be blank".to_string());
        }
        if self.items.is_empty() {
            return Err("at least one item is required".to_string());
        }

        let mut items = Vec::with_capacity(self.items.len());
        for (idx, item) in self.items.iter().enumerate() {
            let product_code = item.product_code.trim();
            let size = item.size.trim();
            if product_code.is_empty() {
                return Err(format!("item {}: product_code must not be blank", idx));
            }
            if size.is_empty() {
                return Err(format!("item {}: size must not be blank", idx));
            }
            if item.quantity == 0 {
                return Err(format!("item {}: quantity must be at least 1", idx));
            }
            items.push(SaleLineInput {
                product_code: product_code.to_string(),
                size: size.to_string(),
                quantity: item.quantity,
                color: item.color.trim().to_string(),
            });
        }

        Ok(NormalizedSale {
            customer_name: customer_name.to_string(),
            items,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// DTO for creating a return.
///
/// `sale_id` arrives as a string and is parsed explicitly, so a malformed
/// id is a 400 on this endpoint rather than a routing miss.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReturn {
    #[validate(length(min = 1))]
    pub sale_id: String,
    #[validate(length(min = 1, max = 100))]
    pub product_code: String,
    #[validate(length(min = 1, max = 100))]
    pub size: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
}

/// Query filters for listing sales
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct SaleFilter {
    /// Case-insensitive substring match on customer name
    pub customer: Option<String>,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Query filters for listing returns
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct ReturnFilter {
    /// Case-insensitive substring match on customer name
    pub customer: Option<String>,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl SaleFilter {
    pub fn offset(&self) -> u64 {
        offset(self.page, self.limit)
    }

    /// Unpaged filter over every sale of one customer. The by-customer
    /// aggregates are computed from the full result set, never a page.
    pub fn all_for_customer(name: String) -> Self {
        Self {
            customer: Some(name),
            page: 1,
            limit: i64::MAX,
        }
    }
}

impl ReturnFilter {
    pub fn offset(&self) -> u64 {
        offset(self.page, self.limit)
    }

    /// Unpaged filter over every return of one customer.
    pub fn all_for_customer(name: String) -> Self {
        Self {
            customer: Some(name),
            page: 1,
            limit: i64::MAX,
        }
    }
}

impl Default for SaleFilter {
    fn default() -> Self {
        Self {
            customer: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Default for ReturnFilter {
    fn default() -> Self {
        Self {
            customer: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

fn offset(page: u64, limit: i64) -> u64 {
    (page.max(1) - 1) * limit.max(0) as u64
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, size: &str, quantity: u32) -> SaleLineInput {
        SaleLineInput {
            product_code: code.to_string(),
            size: size.to_string(),
            quantity,
            color: String::new(),
        }
    }

    #[test]
    fn test_total_items_is_sum_of_line_quantities() {
        let sale = Sale::new(
            "Alice".to_string(),
            vec![
                SaleLine {
                    product_id: Uuid::now_v7(),
                    product_code: "SKU-1".to_string(),
                    size: "M".to_string(),
                    quantity: 2,
                    color: "Blue".to_string(),
                },
                SaleLine {
                    product_id: Uuid::now_v7(),
                    product_code: "SKU-2".to_string(),
                    size: "L".to_string(),
                    quantity: 3,
                    color: "Red".to_string(),
                },
            ],
            String::new(),
        );
        assert_eq!(sale.total_items, 5);
    }

    #[test]
    fn test_normalized_trims_fields() {
        let input = CreateSale {
            customer_name: "  Alice  ".to_string(),
            items: vec![line(" SKU-1 ", " M ", 1)],
            notes: " note ".to_string(),
        };
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.customer_name, "Alice");
        assert_eq!(normalized.items[0].product_code, "SKU-1");
        assert_eq!(normalized.items[0].size, "M");
        assert_eq!(normalized.notes, "note");
    }

    #[test]
    fn test_normalized_rejects_blank_customer() {
        let input = CreateSale {
            customer_name: "   ".to_string(),
            items: vec![line("SKU-1", "M", 1)],
            notes: String::new(),
        };
        assert!(input.normalized().is_err());
    }

    #[test]
    fn test_normalized_rejects_zero_quantity() {
        let input = CreateSale {
            customer_name: "Alice".to_string(),
            items: vec![line("SKU-1", "M", 1), line("SKU-2", "L", 0)],
            notes: String::new(),
        };
        let err = input.normalized().unwrap_err();
        assert!(err.contains("item 1"));
    }

    #[test]
    fn test_validate_rejects_empty_items_list() {
        // the derive reports the offending items value, so the line type
        // has to serialize
        let input = CreateSale {
            customer_name: "Alice".to_string(),
            items: vec![],
            notes: String::new(),
        };
        let err = input.validate().unwrap_err();
        assert!(err.field_errors().contains_key("items"));
    }

    #[test]
    fn test_sale_line_input_serializes() {
        let value = serde_json::to_value(line("SKU-1", "M", 2)).unwrap();
        assert_eq!(value["product_code"], "SKU-1");
        assert_eq!(value["quantity"], 2);
    }

    #[test]
    fn test_normalized_rejects_empty_items() {
        let input = CreateSale {
            customer_name: "Alice".to_string(),
            items: vec![],
            notes: String::new(),
        };
        assert!(input.normalized().is_err());
    }

    #[test]
    fn test_find_line_matches_exact_code_and_size() {
        let sale = Sale::new(
            "Alice".to_string(),
            vec![SaleLine {
                product_id: Uuid::now_v7(),
                product_code: "SKU-1".to_string(),
                size: "M".to_string(),
                quantity: 2,
                color: String::new(),
            }],
            String::new(),
        );
        assert!(sale.find_line("SKU-1", "M").is_some());
        assert!(sale.find_line("SKU-1", "m").is_none());
        assert!(sale.find_line("SKU-2", "M").is_none());
    }
}
