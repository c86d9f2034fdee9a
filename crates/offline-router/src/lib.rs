//! Request-interception cache router.
//!
//! This crate provides:
//! - `CacheRouter` - Install/activate lifecycle and per-request routing
//! - `RoutingTable` / `RoutingRule` - Ordered first-match rules
//! - `HostDenylist` - Opaque cross-origin host matching
//! - `Transport` - The network boundary
//! - `ReqwestTransport` - HTTP transport (feature `http-transport`)
//! - `ClientRegistry` - Client contexts claimed on activation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use offline_cache::InMemoryCacheStorage;
//! use offline_core::{Request, RouterConfig};
//! use offline_router::{CacheRouter, ReqwestTransport};
//!
//! let config = RouterConfig::new("shop-v3").with_origin("https://shop.example.com");
//! let router = CacheRouter::new(
//!     config,
//!     Arc::new(InMemoryCacheStorage::new()),
//!     Arc::new(ReqwestTransport::new()?),
//! )?;
//!
//! router.install().await?;
//! router.activate().await?;
//!
//! let outcome = router.route(Request::get("/css/site.css")?).await?;
//! println!("{} via {} ({})", outcome.response.status, outcome.strategy, outcome.cache_status);
//! ```

mod clients;
mod error;
mod host;
#[cfg(feature = "http-transport")]
mod http;
mod router;
mod rules;
#[cfg(test)]
mod testing;
mod transport;

pub use clients::*;
pub use error::*;
pub use host::*;
#[cfg(feature = "http-transport")]
pub use http::*;
pub use router::*;
pub use rules::*;
pub use transport::*;
