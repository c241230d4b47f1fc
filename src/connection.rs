//! Low-level HTTP transport against the mail.tm REST API.
//!
//! One [`ConnectionManager`] owns the base URL and executes every verb the
//! resource operations need, attaching the bearer token when given one and
//! absorbing HTTP 429 responses with a configurable retry delay. Any other
//! non-2xx status becomes [`Error::Status`] with the response body attached;
//! nothing at this layer retries those.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::models::Token;
use crate::{Error, Result};

const ACCEPT_LD_JSON: &str = "application/ld+json";
const JSON: &str = "application/json";
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// Connection to one API origin, shared by every resource operation.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    http: reqwest::Client,
    base_url: String,
    handle_rate_limit: bool,
    rate_limit_delay: Duration,
}

impl ConnectionManager {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        handle_rate_limit: bool,
        rate_limit_delay: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            handle_rate_limit,
            rate_limit_delay,
        }
    }

    /// The API origin this manager talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a relative endpoint (or a server-provided link like
    /// `/messages?page=2`) onto the base URL.
    fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Execute one call, retrying the identical request after
    /// `rate_limit_delay` for as long as the server answers 429.
    ///
    /// The retry loop is intentionally unbounded; callers that need a hard
    /// deadline should wrap the operation in `tokio::time::timeout`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&Token>,
        body: Option<&Value>,
        content_type: &str,
    ) -> Result<Response> {
        let url = self.endpoint_url(path);
        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .header(ACCEPT, ACCEPT_LD_JSON);
            if let Some(token) = token {
                request = request.bearer_auth(&token.token);
            }
            if let Some(body) = body {
                request = request.header(CONTENT_TYPE, content_type).json(body);
            }

            let response = request.send().await?;
            let status = response.status();
            debug!(%method, path, %status, "api call");

            if status == StatusCode::TOO_MANY_REQUESTS && self.handle_rate_limit {
                tokio::time::sleep(self.rate_limit_delay).await;
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                debug!(path, %status, body = %abbreviate(&body), "api call failed");
                return Err(Error::Status { status, body });
            }
            return Ok(response);
        }
    }

    pub(crate) async fn get(&self, path: &str, token: Option<&Token>) -> Result<Response> {
        self.send(Method::GET, path, token, None, JSON).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&Token>,
    ) -> Result<T> {
        let body = self.get_text(path, token).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn get_text(&self, path: &str, token: Option<&Token>) -> Result<String> {
        let response = self.get(path, token).await?;
        read_logged_body(path, response).await
    }

    pub(crate) async fn get_bytes(&self, path: &str, token: Option<&Token>) -> Result<Vec<u8>> {
        let bytes = self.get(path, token).await?.bytes().await?;
        debug!(path, bytes = bytes.len(), "response body");
        Ok(bytes.to_vec())
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        token: Option<&Token>,
    ) -> Result<T> {
        let response = self.send(Method::POST, path, token, Some(body), JSON).await?;
        let body = read_logged_body(path, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// DELETE the resource; the API signals success with 204 No Content.
    pub(crate) async fn delete(&self, path: &str, token: Option<&Token>) -> Result<bool> {
        let response = self.send(Method::DELETE, path, token, None, JSON).await?;
        Ok(response.status() == StatusCode::NO_CONTENT)
    }

    /// PATCH with merge-patch semantics: only the supplied fields change.
    pub(crate) async fn patch(
        &self,
        path: &str,
        body: &Value,
        token: Option<&Token>,
    ) -> Result<StatusCode> {
        let response = self
            .send(Method::PATCH, path, token, Some(body), MERGE_PATCH_JSON)
            .await?;
        let status = response.status();
        read_logged_body(path, response).await?;
        Ok(status)
    }
}

/// Consume a successful response, logging its abbreviated body.
async fn read_logged_body(path: &str, response: Response) -> Result<String> {
    let body = response.text().await?;
    debug!(path, body = %abbreviate(&body), "response body");
    Ok(body)
}

/// Shorten a response body for the request log.
fn abbreviate(body: &str) -> &str {
    let cut = body
        .char_indices()
        .nth(120)
        .map_or(body.len(), |(index, _)| index);
    &body[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(base_url: &str) -> ConnectionManager {
        ConnectionManager::new(
            reqwest::Client::new(),
            base_url,
            true,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn endpoint_url_joins_relative_paths() {
        let cm = manager("https://api.mail.tm");
        assert_eq!(cm.endpoint_url("token"), "https://api.mail.tm/token");
        assert_eq!(
            cm.endpoint_url("/messages?page=2"),
            "https://api.mail.tm/messages?page=2"
        );
    }

    #[test]
    fn endpoint_url_tolerates_trailing_slash() {
        let cm = manager("https://api.mail.tm/");
        assert_eq!(cm.endpoint_url("domains"), "https://api.mail.tm/domains");
    }

    #[test]
    fn abbreviate_respects_char_boundaries() {
        let short = "body";
        assert_eq!(abbreviate(short), "body");
        let long = "é".repeat(200);
        assert_eq!(abbreviate(&long).chars().count(), 120);
    }
}
