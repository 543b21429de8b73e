//! In-memory store adapter for tagcache, backed by [Moka](https://docs.rs/moka).
//!
//! [`MokaStore`] is a bounded, concurrent cache with per-entry expiry and a
//! tag index, so it can hand out tag-scoped views and flush tag groups.
//!
//! ```
//! use tagcache_moka::MokaStore;
//!
//! let store = MokaStore::builder().max_entries(10_000).build();
//! ```
#![warn(missing_docs)]

mod builder;
mod entry;
mod index;
#[cfg(feature = "metrics")]
pub mod metrics;
mod store;

pub use builder::{ByteCapacity, EntryCapacity, MokaStoreBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
pub use store::MokaStore;
