//! Executes `HttpRequest` values against the network.
//!
//! `UreqTransport` keeps one `ureq::Agent` for its whole lifetime so
//! keep-alive connections are reused between calls. Status codes are never
//! treated as transport failures here; 4xx/5xx come back as data and the
//! client decides what they mean.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one blocking HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        log::debug!("{} {}", request.method, request.url);

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => prepare(self.agent.get(&request.url), &request).call(),
            (HttpMethod::Post, Some(body)) => {
                prepare(self.agent.post(&request.url), &request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => prepare(self.agent.post(&request.url), &request).send_empty(),
            (HttpMethod::Patch, Some(body)) => {
                prepare(self.agent.patch(&request.url), &request).send(body.as_bytes())
            }
            (HttpMethod::Patch, None) => {
                prepare(self.agent.patch(&request.url), &request).send_empty()
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

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
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        log::debug!("{} {} -> {status}", request.method, request.url);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn prepare<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
