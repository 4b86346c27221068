//! Wire DTOs for the PocketBase API.
//!
//! # Design
//! These types mirror the server's JSON shapes one to one and carry no
//! behaviour. The mock-server crate defines its own copies; the integration
//! tests catch schema drift between the two.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    #[serde(default)]
    pub can_backup: bool,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub data: HealthData,
}

// ---------------------------------------------------------------------------
// Admins
// ---------------------------------------------------------------------------

/// An admin account. Any field may be missing when the request narrowed the
/// response with `fields`, so everything defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: u8,
}

/// Credentials for `auth-with-password`. `fields` is sent in the query
/// string, the rest in the body as `identity`/`password`.
#[derive(Debug, Clone, Default)]
pub struct AdminAuthQuery {
    pub email: String,
    pub password: String,
    pub fields: Option<String>,
}

impl AdminAuthQuery {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            fields: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthWithPasswordBody<'a> {
    pub identity: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAuthResponse {
    #[serde(default)]
    pub admin: AdminRecord,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPasswordReset {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

/// Payload for creating an admin. `id` lets the caller pick the 15 character
/// record id; the server generates one otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdmin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<u8>,
}

/// Payload for updating an admin. Omitted fields stay unchanged on the
/// server; a password change needs both `password` and `password_confirm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdmin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<u8>,
}

// ---------------------------------------------------------------------------
// Paginated lists
// ---------------------------------------------------------------------------

/// One page of a list endpoint. With `skipTotal` the server reports `-1` for
/// both totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> ListResult<T> {
    /// Whether another page exists. Unknown when totals were skipped, in
    /// which case a full page is taken as a hint that more may follow.
    pub fn has_more(&self) -> bool {
        if self.total_pages < 0 {
            return self.items.len() as u32 >= self.per_page && self.per_page > 0;
        }
        i64::from(self.page) < self.total_pages
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    #[default]
    Base,
    Auth,
    View,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Value,
}

/// A collection definition. API rules are `None` when the action is
/// restricted to admins, `Some("")` when it is public.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub collection_type: CollectionType,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub schema: Vec<SchemaField>,
    #[serde(default)]
    pub indexes: Vec<String>,
    #[serde(default)]
    pub list_rule: Option<String>,
    #[serde(default)]
    pub view_rule: Option<String>,
    #[serde(default)]
    pub create_rule: Option<String>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
    #[serde(default)]
    pub options: Value,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A collection record. The system columns are typed; every user-defined
/// column lands in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub collection_id: String,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_custom_columns() {
        let record: Record = serde_json::from_str(
            r#"{"id":"abc","collectionId":"c1","collectionName":"posts","created":"","updated":"","title":"Hello","views":3}"#,
        )
        .unwrap();
        assert_eq!(record.collection_name, "posts");
        assert_eq!(record.get_str("title"), Some("Hello"));
        assert_eq!(record.get("views"), Some(&Value::from(3)));
        assert!(record.get("id").is_none());
    }

    #[test]
    fn update_admin_omits_unset_fields() {
        let body = serde_json::to_value(UpdateAdmin {
            avatar: Some(4),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "avatar": 4 }));
    }

    #[test]
    fn create_admin_uses_camel_case() {
        let body = serde_json::to_value(CreateAdmin {
            id: None,
            email: "a@example.com".into(),
            password: "secret12345".into(),
            password_confirm: "secret12345".into(),
            avatar: Some(2),
        })
        .unwrap();
        assert_eq!(body["passwordConfirm"], "secret12345");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn collection_rules_distinguish_null_from_empty() {
        let collection: Collection = serde_json::from_str(
            r#"{"id":"c1","name":"posts","type":"base","listRule":"","viewRule":null}"#,
        )
        .unwrap();
        assert_eq!(collection.collection_type, CollectionType::Base);
        assert_eq!(collection.list_rule.as_deref(), Some(""));
        assert!(collection.view_rule.is_none());
    }

    #[test]
    fn has_more_uses_totals_when_known() {
        let page = ListResult::<AdminRecord> {
            page: 1,
            per_page: 1,
            total_items: 2,
            total_pages: 2,
            items: vec![AdminRecord::default()],
        };
        assert!(page.has_more());

        let skipped = ListResult::<AdminRecord> {
            page: 1,
            per_page: 2,
            total_items: -1,
            total_pages: -1,
            items: vec![AdminRecord::default()],
        };
        assert!(!skipped.has_more());
    }
}
