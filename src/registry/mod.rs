//! Registry interaction
//!
//! This module contains the authenticated request pipeline for the Docker
//! Hub HTTP API: token acquisition and caching, request dispatch with a
//! single 401-driven refresh, lazy pagination, and typed response records.

pub mod auth;
pub mod client;
pub mod request;
pub mod token_manager;
pub mod types;

pub use auth::{Auth, Token};
pub use client::{Client, ClientBuilder};
pub use request::Descriptor;
pub use token_manager::TokenManager;
pub use types::{Page, Paginated, RepositorySummary, TagSummary};
