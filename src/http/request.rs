//! Request handling and transformation.
//!
//! # Responsibilities
//! - Pick up or generate the request ID
//! - Determine the request origin used for authorization
//! - Build the input payload from query string and body
//! - Extract the caller's token
//!
//! # Design Decisions
//! - Query parameters are merged first, body fields override them
//! - The origin is the peer address unless forwarding headers are trusted
//! - IPv4-mapped IPv6 peers are reported as plain IPv4

use std::net::IpAddr;

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderMap, Method, Uri};
use serde_json::{Map, Value};
use thiserror::Error;
use url::form_urlencoded;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Payload field carrying the caller's token.
pub const TOKEN_FIELD: &str = "token";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid request body")]
    Unreadable(#[source] BytesRejection),

    #[error("Invalid request body")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Invalid request body")]
    NotAnObject,
}

/// Request ID set by the request-id layer, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn client_origin(peer: IpAddr, headers: &HeaderMap, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(origin) = forwarded {
            return origin.to_string();
        }
    }
    peer.to_canonical().to_string()
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn insert_pairs(payload: &mut Map<String, Value>, encoded: &[u8]) {
    for (key, value) in form_urlencoded::parse(encoded) {
        payload.insert(key.into_owned(), Value::String(value.into_owned()));
    }
}

/// Build the input payload.
///
/// GET requests (and empty bodies) only use the query string. Other bodies
/// are read as a form when declared so, otherwise as a JSON object.
pub fn build_payload(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Value, PayloadError> {
    let mut payload = Map::new();
    if let Some(query) = uri.query() {
        insert_pairs(&mut payload, query.as_bytes());
    }

    if *method == Method::GET || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(payload));
    }

    if is_form(headers) {
        insert_pairs(&mut payload, body);
    } else {
        match serde_json::from_slice(body).map_err(PayloadError::InvalidJson)? {
            Value::Object(fields) => payload.extend(fields),
            _ => return Err(PayloadError::NotAnObject),
        }
    }

    Ok(Value::Object(payload))
}

/// Token from the payload, falling back to `Authorization: Bearer`.
pub fn credential(payload: &Value, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = payload.get(TOKEN_FIELD).and_then(Value::as_str) {
        return Some(token.to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
}
