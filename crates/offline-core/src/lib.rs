//! Core abstractions for the offline request router.
//!
//! This crate provides the fundamental types and traits:
//! - `Request` / `Response` - The intercepted request and the response handed back
//! - `RequestKey` - Normalized (method, URL) pair identifying a cache entry
//! - `RouterConfig` - Generation id, seed URLs and routing patterns
//! - `Strategy` / `CacheStatus` - How a request was served
//! - `WorkerState` / `RouterObserver` - Lifecycle tracking

mod config;
mod context;
mod error;
mod lifecycle;
mod request;
mod response;
mod strategy;

pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use request::*;
pub use response::*;
pub use strategy::*;

/// Re-exported `http` types used across the public API.
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
