//! State module for tracking run progress
//!
//! # Components
//!
//! - `CategoryState`: lifecycle of one category feed
//!   (pending, discovering, fetching, aggregating, done)

mod category_state;

pub use category_state::{CategoryState, InvalidTransition};
