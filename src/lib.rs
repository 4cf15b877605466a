//! # fetchr-rs
//!
//! 面向远程资源 API 的客户端 CRUD 数据访问层，支持请求合并与多路复用。
//!
//! Client-side CRUD data access over a remote resource API that consolidates
//! requests issued within a short time window into fewer wire calls.
//!
//! ## Overview
//!
//! Callers see one logical call per `create` / `read` / `update` / `delete`.
//! Calls opted into consolidation wait in the client's batch window; when it
//! flushes, calls sharing a destination and batch tag are packed into one
//! multiplexed POST envelope, and the combined response is split back so each
//! caller receives exactly its own result or error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fetchr_rs::{Fetcher, Params};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> fetchr_rs::Result<()> {
//!     let client = Fetcher::builder()
//!         .origin("http://localhost:3000")
//!         .consolidate(true)
//!         .crumb("token-from-page")
//!         .build()?;
//!
//!     // Both reads share one wire call.
//!     let (a, b) = tokio::join!(
//!         client.resource("user").param("id", 1).read(),
//!         client.resource("user").param("id", 2).read(),
//!     );
//!     println!("{} {}", a?, b?);
//!
//!     client
//!         .create("comment", Params::new(), Some(json!({"text": "hi"})), None)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Fetcher`], its builder and the per-call request builder |
//! | [`batch`] | Batch window queue and grouping policy |
//! | [`protocol`] | GET destinations and multiplexed envelopes |
//! | [`transport`] | Transport trait and the reqwest-backed implementation |
//! | [`config`] | Client defaults, per-call overrides and their merge |
//! | [`context`] | Ambient context and crumb |
//! | [`request`] | Logical requests and their completion |

pub mod batch;
pub mod client;
pub mod config;
pub mod context;
pub mod protocol;
pub mod request;
pub mod transport;

pub use client::{Fetcher, FetcherBuilder, ResourceRequestBuilder};
pub use config::{ClientConfig, RequestConfig, ResolvedConfig};
pub use context::Context;
pub use request::{Operation, Params, PendingResponse, Request};
pub use transport::{RawResponse, Transport, TransportConfig, TransportError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
