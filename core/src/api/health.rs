use super::{parse_json, request};
use crate::config::normalize_base_url;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{send, Transport};
use crate::types::HealthResponse;

/// Client for `/api/health`.
#[derive(Debug, Clone)]
pub struct HealthApi {
    base_url: String,
}

impl HealthApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn build_check(&self) -> HttpRequest {
        request(HttpMethod::Get, format!("{}/api/health", self.base_url), None)
    }

    pub fn parse_check(&self, response: HttpResponse) -> Result<HealthResponse, ApiError> {
        parse_json(response, 200)
    }

    /// Ask the server whether it is up.
    pub fn check<T: Transport + ?Sized>(&self, transport: &T) -> Result<HealthResponse, ApiError> {
        self.parse_check(send(transport, &self.build_check())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::ScriptedTransport;

    #[test]
    fn build_check_produces_correct_request() {
        let req = HealthApi::new("http://localhost:8090/").build_check();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8090/api/health");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn check_decodes_health_message() {
        let transport = ScriptedTransport::replying(
            200,
            r#"{"code":200,"message":"API is healthy.","data":{"canBackup":true}}"#,
        );
        let health = HealthApi::new("http://localhost:8090").check(&transport).unwrap();
        assert_eq!(health.message, "API is healthy.");
        assert!(health.data.can_backup);
    }

    #[test]
    fn check_reports_rate_limit() {
        let transport = ScriptedTransport::replying(429, "");
        let err = HealthApi::new("http://localhost:8090").check(&transport).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn parse_check_bad_json() {
        let err = HealthApi::new("http://localhost:8090")
            .parse_check(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
