//! Data model for extracted collections
//!
//! - `MediaItem`: one movie or TV show entry from a list feed
//! - `CategoryKey`: identifies one of the six feeds of a profile
//! - `PageResult`: what one fetched (or failed) feed page contributed
//! - `CollectionSnapshot`: the immutable outcome of a whole run

mod media;
mod snapshot;

pub use media::{Category, CategoryKey, MediaItem, MediaItemBuilder, MediaType};
pub use snapshot::{
    CategoryCollection, CategoryStats, CategoryStatus, CollectionSnapshot, PageOutcome,
    PageResult,
};
