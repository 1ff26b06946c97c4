//! JSON response envelope.
//!
//! Every response body is `{success, data?, count?, message?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data: Some(data),
            message: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A successful list response; `count` is the number of items.
    #[must_use]
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(items.len()),
            data: Some(items),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// A failed response with a client-safe message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A `201 Created` response wrapping the envelope.
#[derive(Debug)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, ApiResponse::ok(self.0)).into_response()
    }
}

/// Serializes as `{}`; the data of a delete response.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Empty {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sets_count() {
        let json = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 3);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_empty_data_and_failure() {
        let json = serde_json::to_value(ApiResponse::ok(Empty {})).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": {}}));

        let json = serde_json::to_value(ApiResponse::failure("Shipment not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "Shipment not found"})
        );
    }

    #[test]
    fn test_created_status() {
        let response = Created(Empty {}).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
