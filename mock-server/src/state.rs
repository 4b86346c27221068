//! In-memory store behind the mock server.
//!
//! The store sits behind a std `RwLock` so tests can inspect it from plain
//! synchronous code (for example to read a password reset token that a real
//! server would have emailed). No guard is ever held across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const SEED_ADMIN_EMAIL: &str = "admin@example.com";
pub const SEED_ADMIN_PASSWORD: &str = "password123456";

/// An admin account as the mock stores it. The password never leaves the
/// store.
#[derive(Clone, Debug, Serialize)]
pub struct Admin {
    pub id: String,
    pub created: String,
    pub updated: String,
    pub email: String,
    pub avatar: u8,
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Default)]
pub struct Store {
    pub admins: Vec<Admin>,
    /// auth token -> admin id
    pub tokens: HashMap<String, String>,
    /// password reset token -> admin id
    pub reset_tokens: HashMap<String, String>,
    /// Collection definitions in their wire shape.
    pub collections: Vec<Value>,
    /// collection name -> records in their wire shape
    pub records: HashMap<String, Vec<Value>>,
}

impl Store {
    pub fn admin_by_email(&self, email: &str) -> Option<&Admin> {
        self.admins.iter().find(|a| a.email.eq_ignore_ascii_case(email))
    }

    pub fn admin_by_id(&self, id: &str) -> Option<&Admin> {
        self.admins.iter().find(|a| a.id == id)
    }

    pub fn admin_by_token(&self, token: &str) -> Option<&Admin> {
        self.tokens.get(token).and_then(|id| self.admin_by_id(id))
    }

    pub fn issue_token(&mut self, admin_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), admin_id.to_string());
        token
    }

    pub fn collection(&self, id_or_name: &str) -> Option<&Value> {
        self.collections
            .iter()
            .find(|c| c["id"] == id_or_name || c["name"] == id_or_name)
    }
}

/// Shared handle to the mock's data plus the rate-limit switch.
#[derive(Clone, Default)]
pub struct MockState {
    store: Arc<RwLock<Store>>,
    rate_limited: Arc<AtomicBool>,
}

impl MockState {
    /// One admin, an auth collection `users` and a public `posts` collection
    /// with three records.
    pub fn seeded() -> Self {
        let state = Self::default();
        {
            let mut store = state.write();
            let now = timestamp();

            store.admins.push(Admin {
                id: new_id(),
                created: now.clone(),
                updated: now.clone(),
                email: SEED_ADMIN_EMAIL.to_string(),
                avatar: 0,
                password: SEED_ADMIN_PASSWORD.to_string(),
            });

            store.collections.push(json!({
                "id": "_pb_users_auth_",
                "created": now,
                "updated": now,
                "name": "users",
                "type": "auth",
                "system": false,
                "schema": [
                    { "id": "users_name", "name": "name", "type": "text", "system": false, "required": false, "options": {} }
                ],
                "indexes": [],
                "listRule": "id = @request.auth.id",
                "viewRule": "id = @request.auth.id",
                "createRule": "",
                "updateRule": "id = @request.auth.id",
                "deleteRule": "id = @request.auth.id",
                "options": { "allowEmailAuth": true, "minPasswordLength": 8 }
            }));
            store.collections.push(json!({
                "id": "pbc_posts00001",
                "created": now,
                "updated": now,
                "name": "posts",
                "type": "base",
                "system": false,
                "schema": [
                    { "id": "posts_title", "name": "title", "type": "text", "system": false, "required": true, "options": {} },
                    { "id": "posts_views", "name": "views", "type": "number", "system": false, "required": false, "options": {} },
                    { "id": "posts_pub", "name": "published", "type": "bool", "system": false, "required": false, "options": {} }
                ],
                "indexes": [],
                "listRule": "",
                "viewRule": "",
                "createRule": null,
                "updateRule": null,
                "deleteRule": null,
                "options": {}
            }));

            let posts = [("Hello PocketBase", 12, true), ("Draft notes", 0, false), ("Second post", 40, true)]
                .into_iter()
                .map(|(title, views, published)| {
                    json!({
                        "id": new_id(),
                        "collectionId": "pbc_posts00001",
                        "collectionName": "posts",
                        "created": now,
                        "updated": now,
                        "title": title,
                        "views": views,
                        "published": published
                    })
                })
                .collect();
            store.records.insert("posts".to_string(), posts);
            store.records.insert(
                "users".to_string(),
                vec![json!({
                    "id": new_id(),
                    "collectionId": "_pb_users_auth_",
                    "collectionName": "users",
                    "created": now,
                    "updated": now,
                    "username": "reader",
                    "email": "reader@example.com",
                    "emailVisibility": false,
                    "verified": true,
                    "name": "Reader"
                })],
            );
        }
        state
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every route answer 429 until switched off again.
    pub fn set_rate_limited(&self, on: bool) {
        self.rate_limited.store(on, Ordering::SeqCst);
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited.load(Ordering::SeqCst)
    }

    /// The pending password reset token for `email`, standing in for the
    /// email PocketBase would send.
    pub fn reset_token_for(&self, email: &str) -> Option<String> {
        let store = self.read();
        let admin_id = store.admin_by_email(email)?.id.clone();
        store
            .reset_tokens
            .iter()
            .find(|(_, id)| **id == admin_id)
            .map(|(token, _)| token.clone())
    }
}

/// 15 character lowercase alphanumeric id, the PocketBase record id shape.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..15].to_string()
}

/// Current time in PocketBase's `2006-01-02 15:04:05.000Z` layout.
pub fn timestamp() -> String {
    humantime::format_rfc3339_millis(SystemTime::now())
        .to_string()
        .replacen('T', " ", 1)
}
