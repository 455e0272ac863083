//! The success envelope shared by every API endpoint.
//!
//! Successful responses are `{"success": true, "data": ..., "meta": ...}`
//! where `meta` is omitted unless the endpoint has paging or aggregate
//! information to report. The failure counterpart lives in
//! [`crate::errors::ErrorResponse`].

use serde::Serialize;
use utoipa::ToSchema;

/// Standard success envelope wrapping a response payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true` for successful responses
    pub success: bool,
    /// The response payload
    pub data: T,
    /// Optional response metadata (paging, totals)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload with no metadata.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    /// Wrap a payload together with serializable metadata.
    ///
    /// Metadata that fails to serialize is dropped rather than failing the
    /// whole response; the payload is what callers care about.
    pub fn with_meta(data: T, meta: impl Serialize) -> Self {
        Self {
            success: true,
            data,
            meta: serde_json::to_value(meta).ok(),
        }
    }
}

/// Paging metadata for list endpoints.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ListMeta {
    /// 1-based page number
    pub page: u64,
    /// Page size
    pub limit: i64,
    /// Total number of matching records
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_envelope_omits_meta() {
        let body = serde_json::to_value(ApiResponse::new(json!({"id": 1}))).unwrap();
        assert_eq!(body, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn test_envelope_with_list_meta() {
        let meta = ListMeta {
            page: 2,
            limit: 10,
            total: 37,
        };
        let body = serde_json::to_value(ApiResponse::with_meta(json!([]), meta)).unwrap();
        assert_eq!(body["meta"], json!({"page": 2, "limit": 10, "total": 37}));
        assert_eq!(body["success"], json!(true));
    }
}
