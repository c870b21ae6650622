//! Client configuration: registry location and credentials

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Default API root, the public Docker Hub registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.hub.docker.com/";

/// Username/password pair for the registry's auth endpoint.
///
/// The secret is owned by the caller and handed over at construction.
/// `Debug` redacts the password so credentials cannot leak through logs.
#[derive(Clone)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the client talks to and how.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub registry_url: Url,
    pub skip_tls: bool,
}

impl ClientConfig {
    /// Parse and validate a registry root URL. The root must end in `/` so
    /// endpoint paths can be joined onto it without ambiguity.
    pub fn new(registry_url: &str) -> Result<Self> {
        let url = Url::parse(registry_url)
            .map_err(|e| Error::Config(format!("invalid registry URL {:?}: {}", registry_url, e)))?;

        if !url.path().ends_with('/') {
            return Err(Error::Config(format!(
                "registry URL must end in \"/\": {:?}",
                registry_url
            )));
        }

        Ok(Self {
            registry_url: url,
            skip_tls: false,
        })
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            registry_url: Url::parse(DEFAULT_REGISTRY_URL).expect("default registry URL is valid"),
            skip_tls: false,
        }
    }
}
