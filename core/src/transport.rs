//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! Resource clients never talk to the network directly; their executing
//! methods hand the built request to [`send`], which runs it through a
//! [`Transport`]. `UreqTransport` is the blocking implementation. Status codes
//! are returned as data so the clients decide what a status means, with one
//! exception: a 429 is turned into `ApiError::RateLimited` right here.

use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, RATE_LIMIT_STATUS};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Anything able to perform one blocking HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();
        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.path.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), request).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), request).send_empty(),
            (HttpMethod::Patch, Some(body)) => {
                with_headers(self.agent.patch(url), request).send(body.as_bytes())
            }
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), request).send_empty(),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    builder = builder.header("accept", "application/json");
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Run `request` through `transport`, logging it and mapping 429.
pub(crate) fn send<T: Transport + ?Sized>(
    transport: &T,
    request: &HttpRequest,
) -> Result<HttpResponse, ApiError> {
    debug!(method = request.method.as_str(), url = %request.path, "sending PocketBase request");

    let response = transport.execute(request).map_err(|e| {
        error!(method = request.method.as_str(), url = %request.path, error = %e, "PocketBase request failed");
        e
    })?;

    if response.status == RATE_LIMIT_STATUS {
        warn!(url = %request.path, "request-limit-reached");
        return Err(ApiError::RateLimited);
    }

    debug!(status = response.status, url = %request.path, "received PocketBase response");
    Ok(response)
}
