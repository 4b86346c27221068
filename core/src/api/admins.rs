use super::{json_request, parse_json, parse_no_content, request};
use crate::config::normalize_base_url;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{fields_query, path_segment, ListQuery};
use crate::transport::{send, Transport};
use crate::types::{
    AdminAuthQuery, AdminAuthResponse, AdminRecord, AuthWithPasswordBody, ConfirmPasswordReset,
    CreateAdmin, ListResult, PasswordResetRequest, UpdateAdmin,
};

/// Client for `/api/admins`.
///
/// Authentication and password-reset endpoints are public; every other
/// operation needs an admin token.
#[derive(Debug, Clone)]
pub struct AdminsApi {
    base_url: String,
}

impl AdminsApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/api/admins{suffix}", self.base_url)
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    pub fn build_auth_with_password(&self, query: &AdminAuthQuery) -> Result<HttpRequest, ApiError> {
        let body = AuthWithPasswordBody {
            identity: &query.email,
            password: &query.password,
        };
        let path = self.url(&format!("/auth-with-password{}", fields_query(query.fields.as_deref())));
        json_request(HttpMethod::Post, path, None, &body)
    }

    pub fn build_auth_refresh(&self, token: &str) -> HttpRequest {
        request(HttpMethod::Post, self.url("/auth-refresh"), Some(token))
    }

    /// Decode the response of either authentication endpoint.
    pub fn parse_auth(&self, response: HttpResponse) -> Result<AdminAuthResponse, ApiError> {
        parse_json(response, 200)
    }

    pub fn auth_with_password<T: Transport + ?Sized>(
        &self,
        transport: &T,
        query: &AdminAuthQuery,
    ) -> Result<AdminAuthResponse, ApiError> {
        let req = self.build_auth_with_password(query)?;
        self.parse_auth(send(transport, &req)?)
    }

    /// Exchange a still-valid admin token for a fresh one.
    pub fn auth_refresh<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
    ) -> Result<AdminAuthResponse, ApiError> {
        self.parse_auth(send(transport, &self.build_auth_refresh(token))?)
    }

    // -----------------------------------------------------------------------
    // Password reset
    // -----------------------------------------------------------------------

    pub fn build_request_password_reset(&self, email: &str) -> Result<HttpRequest, ApiError> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };
        json_request(HttpMethod::Post, self.url("/request-password-reset"), None, &body)
    }

    pub fn build_confirm_password_reset(&self, input: &ConfirmPasswordReset) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, self.url("/confirm-password-reset"), None, input)
    }

    /// Parse any endpoint that answers 204 on success.
    pub fn parse_no_content(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_no_content(response)
    }

    /// Send a password reset email. The server answers 204 whether or not
    /// the address belongs to an admin.
    pub fn request_password_reset<T: Transport + ?Sized>(&self, transport: &T, email: &str) -> Result<(), ApiError> {
        let req = self.build_request_password_reset(email)?;
        self.parse_no_content(send(transport, &req)?)
    }

    pub fn confirm_password_reset<T: Transport + ?Sized>(
        &self,
        transport: &T,
        input: &ConfirmPasswordReset,
    ) -> Result<(), ApiError> {
        let req = self.build_confirm_password_reset(input)?;
        self.parse_no_content(send(transport, &req)?)
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub fn build_list(&self, token: &str, query: &ListQuery) -> HttpRequest {
        let path = self.url(&format!("?{}", query.to_query_string()));
        request(HttpMethod::Get, path, Some(token))
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<ListResult<AdminRecord>, ApiError> {
        parse_json(response, 200)
    }

    pub fn list<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
        query: &ListQuery,
    ) -> Result<ListResult<AdminRecord>, ApiError> {
        self.parse_list(send(transport, &self.build_list(token, query))?)
    }

    pub fn build_view(&self, token: &str, id: &str, fields: Option<&str>) -> HttpRequest {
        let path = self.url(&format!("/{}{}", path_segment(id), fields_query(fields)));
        request(HttpMethod::Get, path, Some(token))
    }

    pub fn build_create(&self, token: &str, input: &CreateAdmin, fields: Option<&str>) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, self.url(&fields_query(fields)), Some(token), input)
    }

    pub fn build_update(
        &self,
        token: &str,
        id: &str,
        input: &UpdateAdmin,
        fields: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let path = self.url(&format!("/{}{}", path_segment(id), fields_query(fields)));
        json_request(HttpMethod::Patch, path, Some(token), input)
    }

    pub fn build_delete(&self, token: &str, id: &str) -> HttpRequest {
        request(HttpMethod::Delete, self.url(&format!("/{}", path_segment(id))), Some(token))
    }

    /// Decode a single admin from view, create or update.
    pub fn parse_admin(&self, response: HttpResponse) -> Result<AdminRecord, ApiError> {
        parse_json(response, 200)
    }

    pub fn view<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
        id: &str,
        fields: Option<&str>,
    ) -> Result<AdminRecord, ApiError> {
        self.parse_admin(send(transport, &self.build_view(token, id, fields))?)
    }

    pub fn create<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
        input: &CreateAdmin,
        fields: Option<&str>,
    ) -> Result<AdminRecord, ApiError> {
        let req = self.build_create(token, input, fields)?;
        self.parse_admin(send(transport, &req)?)
    }

    pub fn update<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
        id: &str,
        input: &UpdateAdmin,
        fields: Option<&str>,
    ) -> Result<AdminRecord, ApiError> {
        let req = self.build_update(token, id, input, fields)?;
        self.parse_admin(send(transport, &req)?)
    }

    pub fn delete<T: Transport + ?Sized>(&self, transport: &T, token: &str, id: &str) -> Result<(), ApiError> {
        self.parse_no_content(send(transport, &self.build_delete(token, id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::ScriptedTransport;

    fn client() -> AdminsApi {
        AdminsApi::new("http://localhost:8090")
    }

    fn body_of(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_auth_with_password_sends_identity() {
        let req = client()
            .build_auth_with_password(&AdminAuthQuery::new("admin@example.com", "password123456"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8090/api/admins/auth-with-password");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.header("authorization").is_none());
        assert_eq!(
            body_of(&req),
            serde_json::json!({ "identity": "admin@example.com", "password": "password123456" })
        );
    }

    #[test]
    fn build_auth_with_password_appends_fields() {
        let query = AdminAuthQuery {
            fields: Some("token".into()),
            ..AdminAuthQuery::new("a@example.com", "pw")
        };
        let req = client().build_auth_with_password(&query).unwrap();
        assert_eq!(req.path, "http://localhost:8090/api/admins/auth-with-password?fields=token");
    }

    #[test]
    fn build_auth_refresh_carries_token_without_body() {
        let req = client().build_auth_refresh("tok");
        assert_eq!(req.path, "http://localhost:8090/api/admins/auth-refresh");
        assert_eq!(req.header("authorization"), Some("tok"));
        assert!(req.body.is_none());
    }

    #[test]
    fn auth_failure_returns_envelope() {
        let transport = ScriptedTransport::replying(
            400,
            r#"{"code":400,"message":"Failed to authenticate.","data":{}}"#,
        );
        let err = client()
            .auth_with_password(&transport, &AdminAuthQuery::new("a@example.com", "wrong"))
            .unwrap_err();
        match err {
            ApiError::Api { status, error } => {
                assert_eq!(status, 400);
                assert_eq!(error.message, "Failed to authenticate.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn request_password_reset_expects_204() {
        let transport = ScriptedTransport::replying(204, "");
        client().request_password_reset(&transport, "a@example.com").unwrap();
        let req = transport.last_request();
        assert_eq!(req.path, "http://localhost:8090/api/admins/request-password-reset");
        assert_eq!(body_of(&req), serde_json::json!({ "email": "a@example.com" }));

        let transport = ScriptedTransport::replying(200, "{}");
        let err = client().request_password_reset(&transport, "a@example.com").unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 200, .. }));
    }

    #[test]
    fn build_confirm_password_reset_body() {
        let req = client()
            .build_confirm_password_reset(&ConfirmPasswordReset {
                token: "reset".into(),
                password: "new-password".into(),
                password_confirm: "new-password".into(),
            })
            .unwrap();
        assert_eq!(
            body_of(&req),
            serde_json::json!({ "token": "reset", "password": "new-password", "passwordConfirm": "new-password" })
        );
    }

    #[test]
    fn build_list_encodes_query() {
        let req = client().build_list("tok", &ListQuery::new().page(1).per_page(10).filter("email ~ 'example'"));
        assert_eq!(
            req.path,
            "http://localhost:8090/api/admins?page=1&perPage=10&filter=%28email+%7E+%27example%27%29&skipTotal=false"
        );
        assert_eq!(req.header("authorization"), Some("tok"));
    }

    #[test]
    fn parse_list_success() {
        let body = r#"{"page":1,"perPage":30,"totalItems":1,"totalPages":1,"items":[{"id":"abc123def456ghi","created":"2024-01-01 00:00:00.000Z","updated":"2024-01-01 00:00:00.000Z","email":"admin@example.com","avatar":3}]}"#;
        let list = client().parse_list(HttpResponse::new(200, body)).unwrap();
        assert_eq!(list.total_items, 1);
        assert_eq!(list.items[0].email, "admin@example.com");
        assert_eq!(list.items[0].avatar, 3);
    }

    #[test]
    fn build_view_and_delete_paths() {
        let c = client();
        assert_eq!(
            c.build_view("tok", "abc", Some("id,email")).path,
            "http://localhost:8090/api/admins/abc?fields=id%2Cemail"
        );
        let del = c.build_delete("tok", "abc");
        assert_eq!(del.method, HttpMethod::Delete);
        assert_eq!(del.path, "http://localhost:8090/api/admins/abc");
    }

    #[test]
    fn build_paths_encode_the_id() {
        let c = client();
        assert_eq!(
            c.build_view("tok", "abc?fields=id", None).path,
            "http://localhost:8090/api/admins/abc%3Ffields%3Did"
        );
        assert_eq!(
            c.build_delete("tok", "a/b c").path,
            "http://localhost:8090/api/admins/a%2Fb%20c"
        );
        let update = c.build_update("tok", "x y", &UpdateAdmin::default(), None).unwrap();
        assert_eq!(update.path, "http://localhost:8090/api/admins/x%20y");
    }

    #[test]
    fn view_not_found() {
        let transport = ScriptedTransport::replying(
            404,
            r#"{"code":404,"message":"The requested resource wasn't found.","data":{}}"#,
        );
        let err = client().view(&transport, "tok", "missing", None).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn build_create_and_update() {
        let c = client();
        let create = c
            .build_create(
                "tok",
                &CreateAdmin {
                    email: "new@example.com".into(),
                    password: "password123456".into(),
                    password_confirm: "password123456".into(),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(create.method, HttpMethod::Post);
        assert_eq!(create.path, "http://localhost:8090/api/admins");

        let update = c
            .build_update("tok", "abc", &UpdateAdmin { avatar: Some(5), ..Default::default() }, None)
            .unwrap();
        assert_eq!(update.method, HttpMethod::Patch);
        assert_eq!(update.path, "http://localhost:8090/api/admins/abc");
        assert_eq!(body_of(&update), serde_json::json!({ "avatar": 5 }));
    }

    #[test]
    fn delete_expects_204() {
        let transport = ScriptedTransport::replying(204, "");
        assert!(client().delete(&transport, "tok", "abc").is_ok());
    }
}
