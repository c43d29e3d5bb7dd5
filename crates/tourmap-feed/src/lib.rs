//! Result assembly and incremental loading for the tourism listing feed.
//!
//! [`FeedController`] owns the filter, search term, and page cursor, drives
//! a [`ListingSource`], and exposes the assembled list through
//! [`FeedSnapshot`].

pub mod cache;
pub mod controller;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod sort;
pub mod source;

pub use cache::{EnrichmentCache, EnrichmentEntry};
pub use controller::{FeedController, FeedSnapshot, LoadOutcome, LoadPhase};
pub use error::FeedError;
pub use filter::FilterState;
pub use source::ListingSource;
