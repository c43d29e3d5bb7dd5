//! Port the controller reads listings and enrichment data through.

use async_trait::async_trait;
use tourmap_tourapi::{ListingPage, ListingQuery, PetPolicy, TourApiClient, TourApiError};

/// Remote listing and enrichment lookups.
///
/// [`TourApiClient`] is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// One page of records for a region.
    async fn area_based_list(&self, query: &ListingQuery) -> Result<ListingPage, TourApiError>;

    /// One page of records matching `keyword`.
    async fn search_keyword(
        &self,
        keyword: &str,
        query: &ListingQuery,
    ) -> Result<ListingPage, TourApiError>;

    /// Pet policy for one record; `Ok(None)` when none is published.
    async fn pet_policy(&self, content_id: &str) -> Result<Option<PetPolicy>, TourApiError>;
}

#[async_trait]
impl ListingSource for TourApiClient {
    async fn area_based_list(&self, query: &ListingQuery) -> Result<ListingPage, TourApiError> {
        TourApiClient::area_based_list(self, query).await
    }

    async fn search_keyword(
        &self,
        keyword: &str,
        query: &ListingQuery,
    ) -> Result<ListingPage, TourApiError> {
        TourApiClient::search_keyword(self, keyword, query).await
    }

    async fn pet_policy(&self, content_id: &str) -> Result<Option<PetPolicy>, TourApiError> {
        self.detail_pet_tour(content_id).await
    }
}
