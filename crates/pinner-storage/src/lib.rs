//! Pinner Storage Library
//!
//! This crate provides the persistence provider abstraction for content-addressable
//! storage backends, the HTTP pinning-service implementation, and the priority-ordered
//! provider selection strategy.
//!
//! # Provider contract
//!
//! - `add` streams a local file to the backend and returns its content identifier
//!   together with a SHA-256 hash computed over the same stream.
//! - `pin` commits an identifier produced by `add` to durable retention.
//! - `is_healthy` is a short, authenticated probe that never errors.

pub mod factory;
pub mod pinata;
pub mod selector;
pub mod traits;

// Re-export commonly used types
pub use factory::create_providers;
pub use pinata::{PinataConfig, PinataProvider};
pub use selector::ProviderSelector;
pub use traits::{AddedContent, PersistenceProvider, ProviderError, ProviderResult};
