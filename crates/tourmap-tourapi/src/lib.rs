pub mod client;
pub mod error;
pub mod normalize;
mod pet;
pub(crate) mod retry;
pub mod types;

pub use client::{ListingPage, ListingQuery, TourApiClient};
pub use error::TourApiError;
pub use normalize::{ListingRecord, PetPolicy};
