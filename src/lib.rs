//! Complete enumeration of a search endpoint that caps every result page.
//!
//! The service returns at most [`DEFAULT_CAP`] records per search and has no
//! pagination. Every cell of the query dimensions (special flags, categories
//! × languages) is resolved by [`coverage::expand`], which narrows capped
//! queries with free-text terms until each partition fits under the cap.
//! [`process::harvest`] drives all cells and merges their records by id.

pub mod auth;
pub mod config;
pub mod coverage;
pub mod dedup;
pub mod details;
mod error;
pub mod filter;
pub mod macros;
pub mod process;
pub mod record;
pub mod request;
pub mod terms;

pub use error::{Error, Result};

/// Most records a single search returns.
pub const DEFAULT_CAP: usize = 150;
pub const DEFAULT_OUTPUT: &str = "data/phs.json";
