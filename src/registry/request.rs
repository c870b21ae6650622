//! Request descriptors
//!
//! A [`Descriptor`] is an immutable description of one API request:
//! method, path relative to the registry root, query parameters and an
//! optional JSON body. The pipeline resolves it to a concrete URL at send
//! time; pagination applies a server-provided cursor without touching the
//! rest of the descriptor.

use reqwest::Method;
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Descriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    page_url: Option<Url>,
}

impl Descriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            page_url: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Resolve the concrete request URL against the registry root. A
    /// descriptor carrying a pagination cursor resolves to the cursor URL
    /// unchanged.
    pub(crate) fn url(&self, root: &Url) -> Result<Url> {
        if let Some(page_url) = &self.page_url {
            return Ok(page_url.clone());
        }

        let mut url = root
            .join(self.path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid request path {:?}: {}", self.path, e)))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Apply a pagination cursor returned by the server for this
    /// descriptor. Method and body are preserved; the URL is replaced by
    /// the server-provided next-page reference (absolute or relative to
    /// the registry root). An unparseable cursor is a malformed server
    /// answer, so it surfaces as a decode failure.
    pub(crate) fn with_page_url(&self, root: &Url, next: &str) -> Result<Descriptor> {
        let page_url = root
            .join(next)
            .map_err(|e| Error::Decode(format!("invalid next-page URL {:?}: {}", next, e)))?;

        Ok(Self {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
            page_url: Some(page_url),
        })
    }
}
