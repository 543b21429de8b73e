#![warn(missing_docs)]
//! # tagcache-core
//!
//! Primitive types shared by every tagcache crate.
//!
//! - [`CacheKey`] - fixed-length fingerprint of a request identity
//! - [`Tag`] and [`TagSet`] - labels used to group entries for invalidation
//! - [`StoreLabel`] - name of a store adapter, used in logs and metrics
//!
//! Nothing here performs I/O. Store adapters live in `tagcache-backend`,
//! the response cache itself in `tagcache`.

pub mod key;
pub mod label;
pub mod tag;

pub use key::CacheKey;
pub use label::StoreLabel;
pub use tag::{Tag, TagSet};

/// Raw byte data type used for serialized cache payloads.
/// Using `Bytes` provides cheap cloning via reference counting.
pub type Raw = bytes::Bytes;
