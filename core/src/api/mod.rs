//! Per-resource PocketBase clients.
//!
//! # Design
//! Each client holds only the base URL (plus the collection name for
//! records) and carries no state between calls. Every operation comes in
//! three pieces: `build_*` produces an `HttpRequest`, `parse_*` consumes an
//! `HttpResponse`, and the plain-named method chains the two through a
//! [`Transport`](crate::transport::Transport).

mod admins;
mod collections;
mod health;
mod records;

pub use admins::AdminsApi;
pub use collections::CollectionsApi;
pub use health::HealthApi;
pub use records::RecordsApi;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{check_status, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

const CONTENT_TYPE_JSON: (&str, &str) = ("content-type", "application/json");

fn request(method: HttpMethod, path: String, token: Option<&str>) -> HttpRequest {
    let mut headers = Vec::new();
    if let Some(token) = token {
        headers.push(("authorization".to_string(), token.to_string()));
    }
    HttpRequest {
        method,
        path,
        headers,
        body: None,
    }
}

fn json_request<B: Serialize>(
    method: HttpMethod,
    path: String,
    token: Option<&str>,
    body: &B,
) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(body).map_err(ApiError::SerializationError)?;
    let mut req = request(method, path, token);
    req.headers
        .push((CONTENT_TYPE_JSON.0.to_string(), CONTENT_TYPE_JSON.1.to_string()));
    req.body = Some(body);
    Ok(req)
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(&response, expected)?;
    serde_json::from_str(&response.body).map_err(ApiError::DeserializationError)
}

fn parse_no_content(response: HttpResponse) -> Result<(), ApiError> {
    check_status(&response, 204)
}
