//! Registry client and request pipeline
//!
//! [`Client`] drives every API call through the same pipeline: obtain a
//! token, send with the bearer attached, refresh-and-retry exactly once on
//! 401, classify failures, decode success bodies into typed records.
//! Listing endpoints depage lazily through [`Client::list`].

use async_stream::try_stream;
use futures::stream::Stream;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ClientConfig, Credential};
use crate::error::{Error, ErrorEnvelope, Result};
use crate::logging::Logger;
use crate::registry::auth::{Auth, Token};
use crate::registry::request::Descriptor;
use crate::registry::token_manager::TokenManager;
use crate::registry::types::{Page, Paginated, RepositorySummary, TagSummary};
use crate::repository::Repository;

pub struct ClientBuilder {
    registry_url: Option<String>,
    credential: Option<Credential>,
    skip_tls: bool,
    log: Logger,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            registry_url: None,
            credential: None,
            skip_tls: false,
            log: Logger::default(),
        }
    }

    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn logger(mut self, log: Logger) -> Self {
        self.log = log;
        self
    }

    pub fn build(self) -> Result<Client> {
        let config = match &self.registry_url {
            Some(url) => ClientConfig::new(url)?.with_skip_tls(self.skip_tls),
            None => ClientConfig::default().with_skip_tls(self.skip_tls),
        };

        let http = if config.skip_tls {
            reqwest::Client::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
        } else {
            reqwest::Client::builder().build()
        }
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let auth = Auth::new(
            http.clone(),
            config.registry_url.clone(),
            self.credential,
            self.log.clone(),
        );
        let tokens = TokenManager::new(auth, self.log.clone());

        Ok(Client {
            http,
            root: config.registry_url,
            tokens,
            log: self.log,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An authenticated Docker Hub API client.
///
/// One instance may be shared across concurrent tasks; the token cache is
/// the only cross-call synchronization point.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    root: Url,
    tokens: TokenManager,
    log: Logger,
}

impl Client {
    /// Anonymous client against the public Docker Hub registry.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The token manager backing this client.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Check whether the registry host supports the API version in use by
    /// the client.
    pub async fn ping(&self) -> Result<bool> {
        self.execute(&Descriptor::get("v2/")).await?;
        Ok(true)
    }

    /// Tags of a repository, lazily depaged in server order.
    pub fn tags<'a>(
        &'a self,
        repository: &Repository,
    ) -> impl Stream<Item = Result<TagSummary>> + 'a {
        let path = format!("v2/repositories/{}/tags/", repository.name());
        self.list::<Paginated<TagSummary>>(Descriptor::get(path))
    }

    /// Repositories under a namespace, lazily depaged in server order.
    pub fn repositories<'a>(
        &'a self,
        namespace: &str,
    ) -> impl Stream<Item = Result<RepositorySummary>> + 'a {
        let path = format!("v2/repositories/{}/", namespace);
        self.list::<Paginated<RepositorySummary>>(Descriptor::get(path))
    }

    /// Issue one request and decode the 2xx body into `T`.
    pub async fn request<T: DeserializeOwned>(&self, descriptor: &Descriptor) -> Result<T> {
        let body = self.execute(descriptor).await?;
        serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Lazy, forward-only sequence over a paginated endpoint.
    ///
    /// The first page is fetched when the stream is first polled; each
    /// following page only when the consumer demands items beyond the
    /// current one. A mid-stream failure yields its error and ends the
    /// stream; items already yielded stay valid.
    pub fn list<'a, P>(&'a self, descriptor: Descriptor) -> impl Stream<Item = Result<P::Item>> + 'a
    where
        P: Page,
        <P as Page>::Item: 'a,
    {
        try_stream! {
            let mut next = Some(descriptor);
            while let Some(descriptor) = next.take() {
                let page: P = self.request(&descriptor).await?;
                let cursor = page.next().map(str::to_owned);
                next = match cursor {
                    Some(cursor) => Some(descriptor.with_page_url(&self.root, &cursor)?),
                    None => None,
                };
                for item in page.into_items() {
                    yield item;
                }
            }
        }
    }

    /// The pipeline core: token attach, single 401-driven refresh+retry,
    /// status classification. Returns the raw success body.
    async fn execute(&self, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let token = self.tokens.get_token().await?;
        let response = self.send(descriptor, &token).await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            self.log
                .debug("received 401, refreshing token and retrying once");
            self.tokens.invalidate();
            let token = self.tokens.get_token().await?;
            let retry = self.send(descriptor, &token).await?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                return Err(Error::Authentication {
                    status: Some(StatusCode::UNAUTHORIZED.as_u16()),
                    reason: "request unauthorized after token refresh".to_string(),
                });
            }
            retry
        } else {
            response
        };

        let status = response.status();

        if status.is_server_error() {
            let reason = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "server error {}: {}",
                status, reason
            )));
        }

        if status.is_client_error() {
            return Err(classify_client_error(status, response).await);
        }

        if !status.is_success() {
            return Err(Error::Transport(format!("unexpected status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response body: {}", e)))?;
        Ok(body.to_vec())
    }

    async fn send(&self, descriptor: &Descriptor, token: &Token) -> Result<Response> {
        let url = descriptor.url(&self.root)?;
        let mut request = self.http.request(descriptor.method().clone(), url);

        if let Some(secret) = token.secret() {
            request = request.bearer_auth(secret);
        }
        if let Some(body) = descriptor.body() {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

/// Build the `Request` error for a non-401 4xx: decoded error body
/// verbatim, plus the Retry-After value for 429.
async fn classify_client_error(status: StatusCode, response: Response) -> Error {
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    // The error body is best-effort: absent or unparseable detail must not
    // mask the status itself.
    let errors = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.errors)
            .unwrap_or_default(),
        Err(_) => Vec::new(),
    };

    Error::Request {
        status: status.as_u16(),
        errors,
        retry_after,
    }
}
