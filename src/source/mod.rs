//! Data source abstraction layer.
//!
//! This module defines the traits the rest of the application talks to
//! ([`DishListSource`], [`DishDetailSource`], [`Authenticator`]), the page
//! request/result types, and [`FetchError`].  The only concrete
//! implementation is the HTTP [`ApiClient`] in [`http`].
//!
//! ## For contributors: adding a new source
//!
//! 1. Create a new file in this directory (e.g. `fixture.rs`).
//! 2. Implement whichever of the traits your source can serve.
//! 3. Add `mod fixture;` below and re-export your struct.
//! 4. Hand an `Arc` of it to [`crate::app::Services`] in `main.rs`.
//!
//! The feed controller, detail screen and login flow only see the traits.

mod dish;
mod http;

pub use dish::{Dish, DishDetail, Ingredient, LoginRequest, LoginResponse};
pub use http::ApiClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Parameters for fetching a single page of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Free-text filter; `None` lists everything.
    pub search: Option<String>,
}

/// One page of dishes plus the size of the full (filtered) result set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub items: Vec<Dish>,
    pub total_count: u64,
}

/// Why a request to the catalog failed.
///
/// Transport problems and non-success responses are collapsed into one type;
/// callers only ever render the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-success status code.
    #[error("server responded with HTTP {0}")]
    Status(u16),
    /// The response body was missing or did not decode.
    #[error("unreadable response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Human-readable message for the UI.
    ///
    /// Failures with no usable response (transport errors and bodies that
    /// don't decode) are reported as network errors with their cause.  A
    /// status the server rejected becomes `fallback`.
    pub fn describe(&self, fallback: &str) -> String {
        match self {
            Self::Network(cause) | Self::Body(cause) => format!("Network error: {cause}"),
            Self::Status(_) => fallback.to_string(),
        }
    }
}

/// Anything that can serve pages of the dish list.
///
/// Implementations must eventually complete or fail each call; the feed
/// controller has no timeout of its own.
#[async_trait]
pub trait DishListSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, FetchError>;
}

/// Anything that can serve a single dish with its ingredients.
#[async_trait]
pub trait DishDetailSource: Send + Sync {
    async fn fetch_detail(&self, dish_id: i64) -> Result<DishDetail, FetchError>;
}

/// Exchanges credentials for a session token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, FetchError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
