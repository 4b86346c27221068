//! In-memory stand-in for the PocketBase endpoints the SDK covers.
//!
//! Responses mimic PocketBase's shapes, including the `{code, message, data}`
//! error envelope, so the client can be exercised end to end without a real
//! server.

pub mod listing;
pub mod state;

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::{debug, info};

pub use listing::{FieldsParams, ListParams};
pub use state::{Admin, MockState, SEED_ADMIN_EMAIL, SEED_ADMIN_PASSWORD};

use state::{new_id, timestamp, Store};

const MIN_ADMIN_PASSWORD: usize = 10;
const MAX_ADMIN_PASSWORD: usize = 72;
const MAX_AVATAR: u8 = 9;

pub fn app() -> Router {
    app_with_state(MockState::seeded())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/admins/auth-with-password", post(auth_with_password))
        .route("/api/admins/auth-refresh", post(auth_refresh))
        .route("/api/admins/request-password-reset", post(request_password_reset))
        .route("/api/admins/confirm-password-reset", post(confirm_password_reset))
        .route("/api/admins", get(list_admins).post(create_admin))
        .route(
            "/api/admins/{id}",
            get(view_admin).patch(update_admin).delete(delete_admin),
        )
        .route("/api/collections", get(list_collections))
        .route("/api/collections/{id_or_name}", get(view_collection))
        .route("/api/collections/{collection}/records", get(list_records))
        .route("/api/collections/{collection}/records/{id}", get(view_record))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::seeded()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock PocketBase listening");
    }
    axum::serve(listener, app_with_state(state)).await
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// A failed request rendered as PocketBase's error envelope.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: &'static str,
    data: Map<String, Value>,
}

impl Failure {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            data: Map::new(),
        }
    }

    fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "The request requires admin authorization token to be set.",
        )
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Only admins can perform this action.")
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "The requested resource wasn't found.")
    }

    fn invalid_body() -> Self {
        Self::bad_request("Failed to load the submitted data due to invalid formatting.")
    }

    fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.data = fields;
        self
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.status.as_u16(),
            "message": self.message,
            "data": self.data,
        });
        (self.status, Json(body)).into_response()
    }
}

type Reply = Result<Response, Failure>;

/// Collects per-field validation errors.
#[derive(Default)]
struct Validation(Map<String, Value>);

impl Validation {
    fn add(&mut self, field: &str, code: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| json!({ "code": code, "message": message }));
    }

    fn finish(self, message: &'static str) -> Result<(), Failure> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(Failure::bad_request(message).with_fields(self.0))
    }

    fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, "validation_required", "Cannot be blank.");
            return false;
        }
        true
    }

    fn email(&mut self, field: &str, value: &str) {
        if self.required(field, value) && !looks_like_email(value) {
            self.add(field, "validation_is_email", "Must be a valid email address.");
        }
    }

    fn password(&mut self, password: &str, confirm: &str) {
        if self.required("password", password) {
            let len = password.chars().count();
            if !(MIN_ADMIN_PASSWORD..=MAX_ADMIN_PASSWORD).contains(&len) {
                self.add(
                    "password",
                    "validation_length_out_of_range",
                    "The length must be between 10 and 72.",
                );
            }
        }
        if self.required("passwordConfirm", confirm) && password != confirm {
            self.add("passwordConfirm", "validation_values_mismatch", "Values don't match.");
        }
    }

    fn avatar(&mut self, avatar: u8) {
        if avatar > MAX_AVATAR {
            self.add("avatar", "validation_max_less_equal_than_required", "Must be no greater than 9.");
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Failure> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|_| Failure::invalid_body())
}

fn json_reply(status: StatusCode, value: Value) -> Reply {
    Ok((status, Json(value)).into_response())
}

fn token_of(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the calling admin or fail with 401.
fn require_admin(store: &Store, headers: &HeaderMap) -> Result<Admin, Failure> {
    token_of(headers)
        .and_then(|token| store.admin_by_token(token))
        .cloned()
        .ok_or_else(Failure::unauthorized)
}

fn admin_json(admin: &Admin) -> Value {
    serde_json::to_value(admin).unwrap_or(Value::Null)
}

async fn rate_limit(State(state): State<MockState>, request: Request, next: Next) -> Response {
    if state.is_rate_limited() {
        debug!(uri = %request.uri(), "rate limit switch is on");
        return Failure::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests.").into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({
        "code": 200,
        "message": "API is healthy.",
        "data": { "canBackup": true }
    }))
}

// ---------------------------------------------------------------------------
// Admin authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthWithPasswordInput {
    identity: String,
    password: String,
}

async fn auth_with_password(
    State(state): State<MockState>,
    Query(params): Query<FieldsParams>,
    body: Bytes,
) -> Reply {
    let input: AuthWithPasswordInput = parse_body(&body)?;

    let mut validation = Validation::default();
    validation.required("identity", &input.identity);
    validation.required("password", &input.password);
    validation.finish("Something went wrong while processing your request.")?;

    let mut store = state.write();
    let admin = store
        .admin_by_email(&input.identity)
        .filter(|admin| admin.password == input.password)
        .cloned()
        .ok_or_else(|| Failure::bad_request("Failed to authenticate."))?;
    let token = store.issue_token(&admin.id);
    info!(admin = %admin.email, "admin authenticated");

    let body = json!({ "admin": admin_json(&admin), "token": token });
    json_reply(StatusCode::OK, listing::project(&body, params.fields.as_deref()))
}

async fn auth_refresh(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let mut store = state.write();
    let admin = require_admin(&store, &headers)?;
    let token = store.issue_token(&admin.id);
    json_reply(StatusCode::OK, json!({ "admin": admin_json(&admin), "token": token }))
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PasswordResetInput {
    email: String,
}

async fn request_password_reset(State(state): State<MockState>, body: Bytes) -> Reply {
    let input: PasswordResetInput = parse_body(&body)?;

    let mut validation = Validation::default();
    validation.email("email", &input.email);
    validation.finish("Something went wrong while processing your request.")?;

    let mut store = state.write();
    if let Some(admin_id) = store.admin_by_email(&input.email).map(|a| a.id.clone()) {
        store.reset_tokens.retain(|_, id| *id != admin_id);
        let token = uuid::Uuid::new_v4().simple().to_string();
        store.reset_tokens.insert(token, admin_id);
        debug!(email = %input.email, "password reset token issued");
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfirmPasswordResetInput {
    token: String,
    password: String,
    password_confirm: String,
}

async fn confirm_password_reset(State(state): State<MockState>, body: Bytes) -> Reply {
    let input: ConfirmPasswordResetInput = parse_body(&body)?;
    let mut store = state.write();

    let mut validation = Validation::default();
    let admin_id = store.reset_tokens.get(&input.token).cloned();
    if validation.required("token", &input.token) && admin_id.is_none() {
        validation.add("token", "validation_invalid_token", "Invalid or expired token.");
    }
    validation.password(&input.password, &input.password_confirm);
    validation.finish("Something went wrong while processing your request.")?;

    let Some(admin_id) = admin_id else {
        return Err(Failure::bad_request("Invalid or expired token."));
    };
    store.reset_tokens.remove(&input.token);
    store.tokens.retain(|_, id| *id != admin_id);
    if let Some(admin) = store.admins.iter_mut().find(|a| a.id == admin_id) {
        admin.password = input.password;
        admin.updated = timestamp();
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Admin CRUD
// ---------------------------------------------------------------------------

async fn list_admins(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply {
    let store = state.read();
    require_admin(&store, &headers)?;
    let items = store.admins.iter().map(admin_json).collect();
    let page = listing::paginate(items, &params)
        .map_err(|_| Failure::bad_request("Invalid filter parameters."))?;
    json_reply(StatusCode::OK, page)
}

async fn view_admin(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<FieldsParams>,
) -> Reply {
    let store = state.read();
    require_admin(&store, &headers)?;
    let admin = store.admin_by_id(&id).ok_or_else(Failure::not_found)?;
    json_reply(StatusCode::OK, listing::project(&admin_json(admin), params.fields.as_deref()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CreateAdminInput {
    id: Option<String>,
    email: String,
    password: String,
    password_confirm: String,
    avatar: u8,
}

async fn create_admin(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<FieldsParams>,
    body: Bytes,
) -> Reply {
    let mut store = state.write();
    require_admin(&store, &headers)?;
    let input: CreateAdminInput = parse_body(&body)?;

    let mut validation = Validation::default();
    if let Some(id) = input.id.as_deref() {
        let valid = id.len() == 15 && id.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            validation.add("id", "validation_invalid_id", "Must be 15 alphanumeric characters.");
        } else if store.admin_by_id(id).is_some() {
            validation.add("id", "validation_id_exists", "The id is already in use.");
        }
    }
    validation.email("email", &input.email);
    if store.admin_by_email(&input.email).is_some() {
        validation.add("email", "validation_admin_email_exists", "Admin email already exists.");
    }
    validation.password(&input.password, &input.password_confirm);
    validation.avatar(input.avatar);
    validation.finish("Failed to create admin.")?;

    let now = timestamp();
    let admin = Admin {
        id: input.id.unwrap_or_else(new_id),
        created: now.clone(),
        updated: now,
        email: input.email,
        avatar: input.avatar,
        password: input.password,
    };
    let body = listing::project(&admin_json(&admin), params.fields.as_deref());
    info!(admin = %admin.email, "admin created");
    store.admins.push(admin);
    json_reply(StatusCode::OK, body)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UpdateAdminInput {
    email: Option<String>,
    password: Option<String>,
    password_confirm: Option<String>,
    avatar: Option<u8>,
}

async fn update_admin(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<FieldsParams>,
    body: Bytes,
) -> Reply {
    let mut store = state.write();
    require_admin(&store, &headers)?;
    if store.admin_by_id(&id).is_none() {
        return Err(Failure::not_found());
    }
    let input: UpdateAdminInput = parse_body(&body)?;

    let mut validation = Validation::default();
    if let Some(email) = input.email.as_deref() {
        validation.email("email", email);
        if store.admin_by_email(email).is_some_and(|other| other.id != id) {
            validation.add("email", "validation_admin_email_exists", "Admin email already exists.");
        }
    }
    if input.password.is_some() || input.password_confirm.is_some() {
        validation.password(
            input.password.as_deref().unwrap_or_default(),
            input.password_confirm.as_deref().unwrap_or_default(),
        );
    }
    if let Some(avatar) = input.avatar {
        validation.avatar(avatar);
    }
    validation.finish("Failed to update admin.")?;

    let admin = store
        .admins
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(Failure::not_found)?;
    if let Some(email) = input.email {
        admin.email = email;
    }
    if let Some(password) = input.password {
        admin.password = password;
    }
    if let Some(avatar) = input.avatar {
        admin.avatar = avatar;
    }
    admin.updated = timestamp();
    let body = listing::project(&admin_json(admin), params.fields.as_deref());
    json_reply(StatusCode::OK, body)
}

async fn delete_admin(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut store = state.write();
    require_admin(&store, &headers)?;
    if store.admin_by_id(&id).is_none() {
        return Err(Failure::not_found());
    }
    if store.admins.len() == 1 {
        return Err(Failure::bad_request("You can't delete the only existing admin."));
    }
    store.admins.retain(|a| a.id != id);
    store.tokens.retain(|_, admin_id| *admin_id != id);
    store.reset_tokens.retain(|_, admin_id| *admin_id != id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Collections and records
// ---------------------------------------------------------------------------

async fn list_collections(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply {
    let store = state.read();
    require_admin(&store, &headers)?;
    let page = listing::paginate(store.collections.clone(), &params)
        .map_err(|_| Failure::bad_request("Invalid filter parameters."))?;
    json_reply(StatusCode::OK, page)
}

async fn view_collection(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id_or_name): Path<String>,
    Query(params): Query<FieldsParams>,
) -> Reply {
    let store = state.read();
    require_admin(&store, &headers)?;
    let collection = store.collection(&id_or_name).ok_or_else(Failure::not_found)?;
    json_reply(StatusCode::OK, listing::project(collection, params.fields.as_deref()))
}

/// Only an empty rule (`""`) opens an action to everyone; any other rule is
/// treated as admin-only.
fn check_rule(store: &Store, collection: &Value, rule: &str, headers: &HeaderMap) -> Result<(), Failure> {
    if collection[rule].as_str() == Some("") {
        return Ok(());
    }
    match token_of(headers) {
        Some(token) if store.admin_by_token(token).is_some() => Ok(()),
        Some(_) => Err(Failure::unauthorized()),
        None => Err(Failure::forbidden()),
    }
}

async fn list_records(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> Reply {
    let store = state.read();
    let definition = store.collection(&collection).ok_or_else(Failure::not_found)?;
    check_rule(&store, definition, "listRule", &headers)?;

    let name = definition["name"].as_str().unwrap_or_default();
    let records = store.records.get(name).cloned().unwrap_or_default();
    let page = listing::paginate(records, &params)
        .map_err(|_| Failure::bad_request("Invalid filter parameters."))?;
    json_reply(StatusCode::OK, page)
}

async fn view_record(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<FieldsParams>,
) -> Reply {
    let store = state.read();
    let definition = store.collection(&collection).ok_or_else(Failure::not_found)?;
    check_rule(&store, definition, "viewRule", &headers)?;

    let name = definition["name"].as_str().unwrap_or_default();
    let record = store
        .records
        .get(name)
        .and_then(|records| records.iter().find(|r| r["id"] == id.as_str()))
        .ok_or_else(Failure::not_found)?;
    json_reply(StatusCode::OK, listing::project(record, params.fields.as_deref()))
}
