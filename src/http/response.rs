//! Response shaping.
//!
//! # Responsibilities
//! - Turn a `RequestOutcome` into the JSON response callers expect
//!
//! # Design Decisions
//! - Success bodies are `{"message": ...}`, failures `{"error": ...}`
//! - The status code is the outcome status, unchanged

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::dispatch::RequestOutcome;

impl IntoResponse for RequestOutcome {
    fn into_response(self) -> Response {
        let body = if self.is_success() {
            json!({ "message": self.message })
        } else {
            json!({ "error": self.message })
        };
        (self.status, Json(body)).into_response()
    }
}
