//! Query-string construction for list and single-item endpoints.

use url::form_urlencoded::{byte_serialize, Serializer};

/// Options shared by every PocketBase list endpoint.
///
/// Unset or empty options are left out of the query string, except
/// `skip_total`, which is always sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub fields: Option<String>,
    pub skip_total: bool,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Comma separated sort columns; prefix with `-` for descending order.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn skip_total(mut self, skip_total: bool) -> Self {
        self.skip_total = skip_total;
        self
    }

    /// Encode as `page=..&perPage=..&sort=..&filter=(..)&fields=..&skipTotal=..`.
    pub fn to_query_string(&self) -> String {
        let mut query = Serializer::new(String::new());

        if let Some(page) = self.page.filter(|p| *p > 0) {
            query.append_pair("page", &page.to_string());
        }
        if let Some(per_page) = self.per_page.filter(|p| *p > 0) {
            query.append_pair("perPage", &per_page.to_string());
        }
        if let Some(sort) = non_empty(&self.sort) {
            query.append_pair("sort", sort);
        }
        if let Some(filter) = non_empty(&self.filter) {
            query.append_pair("filter", &format!("({filter})"));
        }
        if let Some(fields) = non_empty(&self.fields) {
            query.append_pair("fields", fields);
        }
        query.append_pair("skipTotal", if self.skip_total { "true" } else { "false" });

        query.finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Build the `?fields=..` suffix for single-item endpoints. Returns an empty
/// string when there is nothing to narrow.
pub fn fields_query(fields: Option<&str>) -> String {
    match fields.map(str::trim).filter(|f| !f.is_empty()) {
        Some(fields) => {
            let encoded = Serializer::new(String::new())
                .append_pair("fields", fields)
                .finish();
            format!("?{encoded}")
        }
        None => String::new(),
    }
}

/// Percent-encode one URL path segment, so ids and collection names can
/// never add segments or a query string of their own.
pub fn path_segment(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}
