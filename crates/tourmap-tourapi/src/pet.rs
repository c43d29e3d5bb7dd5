//! Pet-travel detail endpoint for the TourAPI client.

use crate::client::{TourApiClient, OP_DETAIL_PET_TOUR};
use crate::error::TourApiError;
use crate::normalize::{normalize_pet_policy, PetPolicy};
use crate::types::RawPetTourItem;

impl TourApiClient {
    /// Fetches the pet-accompaniment policy for one content id
    /// (`detailPetTour2`).
    ///
    /// Returns `Ok(None)` when the service has no pet data for the record.
    ///
    /// # Errors
    ///
    /// - [`TourApiError::Api`] and the other envelope errors on API failure.
    /// - [`TourApiError::Http`] on network failure after retries.
    /// - [`TourApiError::Deserialize`] if the single item does not decode.
    pub async fn detail_pet_tour(&self, content_id: &str) -> Result<Option<PetPolicy>, TourApiError> {
        let params = [("contentId", content_id.trim().to_owned())];
        let body = self.get_body(OP_DETAIL_PET_TOUR, &params).await?;

        let Some(first) = body.items.into_values().into_iter().next() else {
            tracing::debug!(content_id, "no pet policy published");
            return Ok(None);
        };

        let raw: RawPetTourItem =
            serde_json::from_value(first).map_err(|e| TourApiError::Deserialize {
                context: format!("{OP_DETAIL_PET_TOUR}(contentId={content_id})"),
                source: e,
            })?;
        Ok(Some(normalize_pet_policy(raw)))
    }
}
