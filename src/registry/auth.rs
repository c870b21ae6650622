//! Authentication against the registry's token service
//!
//! Docker registries hand out bearer tokens through a separate auth
//! endpoint advertised in the `WWW-Authenticate` challenge on `/v2/`. The
//! [`Auth`] collaborator performs one full acquisition: read the
//! challenge, query the advertised realm with the stored credential, and
//! return a [`Token`]. Caching and refresh policy live in the token
//! manager, not here.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;
use url::Url;

use crate::config::Credential;
use crate::error::{Error, Result};
use crate::logging::Logger;

/// Tokens within this margin of expiry are treated as already invalid, so
/// a token cannot lapse between the freshness check and the request.
const EXPIRY_SKEW: Duration = Duration::from_secs(10);

/// A bearer token and its expiry instant.
///
/// Tokens are replaced wholesale on refresh, never edited in place: a
/// `Token` is either fresh (usable) or invalid (must be replaced).
#[derive(Clone)]
pub struct Token {
    secret: Option<String>,
    expires_at: Option<Instant>,
}

impl Token {
    pub(crate) fn bearer(secret: String, expires_in: Option<Duration>) -> Self {
        Self {
            secret: Some(secret),
            expires_at: expires_in.map(|ttl| Instant::now() + ttl),
        }
    }

    /// Token for registries that answer `/v2/` without a challenge; no
    /// authorization header is attached for it.
    pub(crate) fn anonymous() -> Self {
        Self {
            secret: None,
            expires_at: None,
        }
    }

    /// The bearer string to attach verbatim, or `None` for anonymous
    /// access.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() + EXPIRY_SKEW < expires_at,
            None => true,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field(
                "secret",
                &self.secret.as_ref().map(|s| format!("<{} chars>", s.len())),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct AuthChallenge {
    realm: String,
    service: String,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// The auth-endpoint collaborator. Cheap to clone; the underlying HTTP
/// client is shared.
#[derive(Debug, Clone)]
pub struct Auth {
    http: reqwest::Client,
    registry_url: Url,
    credential: Option<Credential>,
    log: Logger,
}

impl Auth {
    pub fn new(
        http: reqwest::Client,
        registry_url: Url,
        credential: Option<Credential>,
        log: Logger,
    ) -> Self {
        Self {
            http,
            registry_url,
            credential,
            log,
        }
    }

    /// Acquire a fresh token from the auth endpoint.
    pub async fn fetch_token(&self) -> Result<Token> {
        match self.fetch_challenge().await? {
            Some(challenge) => self.fetch_bearer(&challenge).await,
            None => {
                self.log.debug("no authentication challenge from registry");
                Ok(Token::anonymous())
            }
        }
    }

    /// Probe `/v2/` for a `WWW-Authenticate` bearer challenge.
    async fn fetch_challenge(&self) -> Result<Option<AuthChallenge>> {
        let url = self
            .registry_url
            .join("v2/")
            .map_err(|e| Error::Config(format!("cannot build /v2/ URL: {}", e)))?;

        let response = self.http.get(url).send().await.map_err(|e| {
            Error::Authentication {
                status: None,
                reason: format!("auth challenge request failed: {}", e),
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            if let Some(header) = response.headers().get(reqwest::header::WWW_AUTHENTICATE) {
                let header = header.to_str().map_err(|e| Error::Authentication {
                    status: Some(status.as_u16()),
                    reason: format!("unreadable WWW-Authenticate header: {}", e),
                })?;
                return Ok(parse_bearer_challenge(header));
            }
            return Ok(None);
        }

        if status.is_success() {
            return Ok(None);
        }

        Err(Error::Authentication {
            status: Some(status.as_u16()),
            reason: format!("unexpected status {} from auth challenge probe", status),
        })
    }

    /// Query the challenge's realm for a bearer token.
    async fn fetch_bearer(&self, challenge: &AuthChallenge) -> Result<Token> {
        let mut url = Url::parse(&challenge.realm).map_err(|e| Error::Authentication {
            status: None,
            reason: format!("invalid realm {:?} in auth challenge: {}", challenge.realm, e),
        })?;

        url.query_pairs_mut()
            .append_pair("service", &challenge.service);
        if let Some(scope) = &challenge.scope {
            url.query_pairs_mut().append_pair("scope", scope);
        }

        self.log
            .debug(&format!("requesting token from realm {}", url.path()));

        let mut request = self.http.get(url);
        if let Some(credential) = &self.credential {
            request = request.basic_auth(credential.username(), Some(credential.password()));
        }

        let response = request.send().await.map_err(|e| Error::Authentication {
            status: None,
            reason: format!("token request failed: {}", e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                reason: format!("token service rejected request: {}", status),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| Error::Authentication {
            status: Some(status.as_u16()),
            reason: format!("unparseable token response: {}", e),
        })?;

        let secret = body
            .token
            .or(body.access_token)
            .ok_or_else(|| Error::Authentication {
                status: Some(status.as_u16()),
                reason: "token response contained no token".to_string(),
            })?;

        self.log.debug(&format!(
            "token obtained ({} chars, expires in {:?}s)",
            secret.len(),
            body.expires_in
        ));

        Ok(Token::bearer(
            secret,
            body.expires_in.map(Duration::from_secs),
        ))
    }
}

/// Parse `Bearer realm="...",service="...",scope="..."`.
fn parse_bearer_challenge(header: &str) -> Option<AuthChallenge> {
    let params_str = header.strip_prefix("Bearer ")?;

    let mut params = HashMap::new();
    for param in params_str.split(',') {
        if let Some((key, value)) = param.trim().split_once('=') {
            params.insert(key.trim(), value.trim().trim_matches('"'));
        }
    }

    let realm = params.get("realm")?;
    Some(AuthChallenge {
        realm: realm.to_string(),
        service: params.get("service").copied().unwrap_or("").to_string(),
        scope: params.get("scope").map(|s| s.to_string()),
    })
}
