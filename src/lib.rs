//! Asynchronous client library for the Docker Hub registry HTTP API.
//!
//! The crate is organized around two collaborating pieces: the
//! [`TokenManager`](registry::TokenManager), which acquires and caches
//! bearer tokens from the registry's auth endpoint, and the
//! [`Client`](registry::Client) request pipeline, which issues requests
//! with the current token, retries exactly once on authentication expiry,
//! follows pagination cursors lazily, and decodes JSON bodies into typed
//! records.
//!
//! ```no_run
//! use dockerhub_client::{Client, Repository};
//! use futures::TryStreamExt;
//!
//! # async fn example() -> dockerhub_client::Result<()> {
//! let client = Client::new()?;
//! let repository = Repository::parse("library/alpine").expect("valid name");
//!
//! let tags: Vec<_> = client.tags(&repository).try_collect().await?;
//! for tag in tags {
//!     println!("{}", tag.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod registry;
pub mod repository;

pub use config::{ClientConfig, Credential, DEFAULT_REGISTRY_URL};
pub use digest::{Digest, DigestAlgorithm, InvalidDigest};
pub use error::{ApiError, Error, ErrorCode, Result};
pub use logging::Logger;
pub use registry::{
    Auth, Client, ClientBuilder, Descriptor, Page, Paginated, RepositorySummary, TagSummary,
    Token, TokenManager,
};
pub use repository::{InvalidRepositoryName, Repository};
