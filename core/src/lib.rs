//! Blocking client SDK for the PocketBase REST API.
//!
//! # Overview
//! Covers the health, admin, collection and record endpoints. Every
//! operation builds an `HttpRequest`, runs it through a `Transport`,
//! branches on the status code and decodes one JSON body.
//!
//! # Design
//! - Resource clients (`HealthApi`, `AdminsApi`, `CollectionsApi`,
//!   `RecordsApi`) hold only the base URL and keep no state between calls.
//! - Each operation is split into `build_*` and `parse_*`, so requests and
//!   responses can be inspected or replayed without a network.
//! - `UreqTransport` performs the blocking round-trip; tests substitute
//!   their own `Transport`.
//! - Non-2xx responses are decoded into the server's error envelope where
//!   possible; 429 becomes `ApiError::RateLimited`.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod transport;
pub mod types;

pub use api::{AdminsApi, CollectionsApi, HealthApi, RecordsApi};
pub use config::ClientConfig;
pub use error::{ApiError, ErrorInfo, PocketBaseError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{fields_query, path_segment, ListQuery};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AdminAuthQuery, AdminAuthResponse, AdminRecord, Collection, CollectionType,
    ConfirmPasswordReset, CreateAdmin, HealthData, HealthResponse, ListResult,
    PasswordResetRequest, Record, SchemaField, UpdateAdmin,
};
