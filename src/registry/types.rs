//! Typed response records
//!
//! Decoded representations of the API's JSON bodies. Required fields are
//! required: a response missing one fails decoding instead of producing a
//! partially-populated record.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::digest::Digest;

/// One page of a listing response.
pub trait Page: DeserializeOwned {
    type Item;

    /// Continuation reference for the next page, if the listing has one.
    fn next(&self) -> Option<&str>;

    /// The records on this page, in server-returned order.
    fn into_items(self) -> Vec<Self::Item>;
}

/// Docker Hub's pagination envelope:
/// `{"count": N, "next": url|null, "previous": url|null, "results": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: DeserializeOwned> Page for Paginated<T> {
    type Item = T;

    fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    fn into_items(self) -> Vec<T> {
        self.results
    }
}

/// One tag of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct TagSummary {
    pub name: String,
    #[serde(default)]
    pub digest: Option<Digest>,
    #[serde(default)]
    pub full_size: Option<u64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// One repository in a namespace listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pull_count: Option<u64>,
    #[serde(default)]
    pub star_count: Option<u64>,
}
