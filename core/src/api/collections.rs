use super::{parse_json, request};
use crate::config::normalize_base_url;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{fields_query, path_segment, ListQuery};
use crate::transport::{send, Transport};
use crate::types::{Collection, ListResult};

/// Client for `/api/collections`. Collection definitions are admin-only.
#[derive(Debug, Clone)]
pub struct CollectionsApi {
    base_url: String,
}

impl CollectionsApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn build_list(&self, token: &str, query: &ListQuery) -> HttpRequest {
        let path = format!("{}/api/collections?{}", self.base_url, query.to_query_string());
        request(HttpMethod::Get, path, Some(token))
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<ListResult<Collection>, ApiError> {
        parse_json(response, 200)
    }

    pub fn list<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
        query: &ListQuery,
    ) -> Result<ListResult<Collection>, ApiError> {
        self.parse_list(send(transport, &self.build_list(token, query))?)
    }

    pub fn build_view(&self, token: &str, id_or_name: &str, fields: Option<&str>) -> HttpRequest {
        let path = format!(
            "{}/api/collections/{}{}",
            self.base_url,
            path_segment(id_or_name),
            fields_query(fields)
        );
        request(HttpMethod::Get, path, Some(token))
    }

    pub fn parse_view(&self, response: HttpResponse) -> Result<Collection, ApiError> {
        parse_json(response, 200)
    }

    pub fn view<T: Transport + ?Sized>(
        &self,
        transport: &T,
        token: &str,
        id_or_name: &str,
        fields: Option<&str>,
    ) -> Result<Collection, ApiError> {
        self.parse_view(send(transport, &self.build_view(token, id_or_name, fields))?)
    }
}
