use super::{parse_json, request};
use crate::config::normalize_base_url;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{fields_query, path_segment, ListQuery};
use crate::transport::{send, Transport};
use crate::types::{ListResult, Record};

/// Read-only client for the records of one collection.
///
/// The token is optional: whether a request needs one is decided by the
/// collection's API rules on the server.
#[derive(Debug, Clone)]
pub struct RecordsApi {
    base_url: String,
    collection: String,
}

impl RecordsApi {
    pub fn new(base_url: &str, collection: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            collection: collection.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/api/collections/{}/records{suffix}",
            self.base_url,
            path_segment(&self.collection)
        )
    }

    pub fn build_list(&self, token: Option<&str>, query: &ListQuery) -> HttpRequest {
        request(HttpMethod::Get, self.url(&format!("?{}", query.to_query_string())), token)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<ListResult<Record>, ApiError> {
        parse_json(response, 200)
    }

    pub fn list<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListResult<Record>, ApiError> {
        self.parse_list(send(transport, &self.build_list(token, query))?)
    }

    pub fn build_view(&self, token: Option<&str>, id: &str, fields: Option<&str>) -> HttpRequest {
        request(HttpMethod::Get, self.url(&format!("/{}{}", path_segment(id), fields_query(fields))), token)
    }

    pub fn parse_view(&self, response: HttpResponse) -> Result<Record, ApiError> {
        parse_json(response, 200)
    }

    pub fn view<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: Option<&str>,
        id: &str,
        fields: Option<&str>,
    ) -> Result<Record, ApiError> {
        self.parse_view(send(transport, &self.build_view(token, id, fields))?)
    }
}
