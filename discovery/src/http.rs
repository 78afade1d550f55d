// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport for discovery queries.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, Identity, Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::config::{AuthMethod, DiscoveryConfig};
use crate::error::DavError;
use crate::request::{Depth, Prop, PropFindRequest};
use crate::response::MultiStatusResponse;

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// A parsed PROPFIND answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropFindResponse {
    /// URL that finally answered, after redirects. Hrefs resolve against it.
    pub url: Url,
    /// The parsed multistatus body.
    pub multistatus: MultiStatusResponse,
}

/// The `WebDAV` operations discovery needs.
///
/// Implementations attach credentials to every request and report a 401 answer as
/// [`DavError::Unauthorized`].
#[async_trait]
pub trait DavTransport: Send + Sync {
    /// Issues a PROPFIND for `props` on `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success, or the body is not a
    /// valid multistatus document.
    async fn propfind(
        &self,
        url: &Url,
        depth: Depth,
        props: &[Prop],
    ) -> Result<PropFindResponse, DavError>;

    /// Issues an OPTIONS request on `url` and returns the tokens of every `DAV` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    async fn options(&self, url: &Url) -> Result<Vec<String>, DavError>;
}

/// [`DavTransport`] over `reqwest`.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    config: DiscoveryConfig,
}

impl HttpTransport {
    /// Creates a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails or the client certificate cannot be read.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DavError> {
        let mut builder = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .redirect(Policy::none());

        if let AuthMethod::ClientCertificate { identity_pem } = &config.auth {
            let pem = std::fs::read(identity_pem).map_err(|e| {
                DavError::Config(format!(
                    "Failed to read client certificate {}: {e}",
                    identity_pem.display()
                ))
            })?;
            let identity = Identity::from_pem(&pem)
                .map_err(|e| DavError::Config(format!("Invalid client certificate: {e}")))?;
            builder = builder.identity(identity);
        }

        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    fn build_request(&self, method: Method, url: &Url) -> RequestBuilder {
        let mut req = self.client.request(method, url.clone());

        match &self.config.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::Bearer { token } => {
                req = req.bearer_auth(token);
            }
            AuthMethod::None | AuthMethod::ClientCertificate { .. } => {}
        }

        req
    }

    /// Sends a request, following redirects with the original method and body.
    ///
    /// The URL of the returned response is the final one.
    async fn execute(
        &self,
        method: &Method,
        url: &Url,
        prepare: impl Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    ) -> Result<Response, DavError> {
        let mut url = url.clone();
        for _ in 0..=MAX_REDIRECTS {
            let resp = prepare(self.build_request(method.clone(), &url))
                .send()
                .await?;

            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .filter(|_| resp.status().is_redirection());
            if let Some(location) = location {
                let next = url.join(location)?;
                tracing::debug!(from = %url, to = %next, "following redirect");
                url = next;
                continue;
            }

            return Self::check_status(resp).await;
        }
        Err(DavError::Http(format!("Too many redirects, last at {url}")))
    }

    /// Maps non-success statuses to errors.
    async fn check_status(resp: Response) -> Result<Response, DavError> {
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::UNAUTHORIZED => Err(DavError::Unauthorized),
            status => {
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response".to_string());
                Err(DavError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl DavTransport for HttpTransport {
    async fn propfind(
        &self,
        url: &Url,
        depth: Depth,
        props: &[Prop],
    ) -> Result<PropFindResponse, DavError> {
        let xml_body = PropFindRequest::with_props(props).build()?;
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| DavError::Http(format!("Invalid method: {e}")))?;

        tracing::debug!(%url, %depth, "PROPFIND");
        let resp = self
            .execute(&method, url, |req| {
                req.header(CONTENT_TYPE, "application/xml; charset=utf-8")
                    .header("Depth", depth.as_str())
                    .body(xml_body.clone())
            })
            .await?;

        let final_url = resp.url().clone();
        let xml = resp.text().await?;
        let multistatus = MultiStatusResponse::from_xml(&xml)
            .map_err(|e| DavError::InvalidResponse(format!("{e}; body: {xml}")))?;

        Ok(PropFindResponse {
            url: final_url,
            multistatus,
        })
    }

    async fn options(&self, url: &Url) -> Result<Vec<String>, DavError> {
        tracing::debug!(%url, "OPTIONS");
        let resp = self.execute(&Method::OPTIONS, url, |req| req).await?;

        Ok(resp
            .headers()
            .get_all("DAV")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect())
    }
}
