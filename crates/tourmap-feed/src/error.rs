use thiserror::Error;
use tourmap_tourapi::TourApiError;

/// Failure of a page-producing load.
///
/// Every remote failure arrives here as one value; the controller only uses
/// the variant to pick the message shown upstream.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Source(#[from] TourApiError),
}

impl FeedError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Source(err) => err.user_message(),
        }
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            FeedError::Source(err) => err.is_configuration(),
        }
    }
}
