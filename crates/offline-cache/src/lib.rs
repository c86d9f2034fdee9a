//! Generation-scoped response store for the offline request router.
//!
//! This crate provides:
//! - `CacheStorage` - The store boundary (open/match/put/delete/enumerate)
//! - `GenerationId` - Name of a cache generation
//! - `CachedResponse` - Stored snapshot of a response
//! - `InMemoryCacheStorage` - Process-local backend
//! - `FsCacheStorage` - One JSON file per generation
//!
//! # Example
//!
//! ```ignore
//! use offline_cache::{CacheStorage, CachedResponse, GenerationId, InMemoryCacheStorage};
//!
//! let storage = InMemoryCacheStorage::new();
//! let generation = GenerationId::new("shop-v3");
//!
//! storage.open(&generation).await?;
//! storage.put(&generation, request.key(), CachedResponse::from_response(&response)).await?;
//! let hit = storage.match_entry(&generation, &request.key()).await?;
//! ```

mod entry;
mod error;
mod fs;
mod generation;
mod memory;
mod storage;

pub use entry::*;
pub use error::*;
pub use fs::*;
pub use generation::*;
pub use memory::*;
pub use storage::*;
