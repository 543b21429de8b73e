//! Store adapter traits and payload formats for tagcache.
//!
//! If you want to plug your own storage engine into the response cache,
//! implement [`Store`] (and [`TaggableStore`] if the engine can scope entries
//! by tag).
mod error;
pub mod format;
mod store;

pub use error::StoreError;
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};
pub use store::{Store, StoreResult, TaggableStore};

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
