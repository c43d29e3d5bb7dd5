//! Conversion of raw TourAPI rows into the records the feed works with.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tourmap_core::{ContentType, Coordinates};

use crate::types::{RawListingItem, RawPetTourItem};

/// Marker TourAPI uses in accompaniment fields for "not allowed".
const NOT_ALLOWED_MARKER: &str = "불가";

/// One tourism point of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    pub content_id: String,
    pub title: String,
    pub content_type: ContentType,
    pub addr1: Option<String>,
    pub addr2: Option<String>,
    /// Raw x (longitude) as delivered; see [`ListingRecord::position`].
    pub map_x: Option<String>,
    /// Raw y (latitude) as delivered.
    pub map_y: Option<String>,
    pub first_image: Option<String>,
    pub first_image2: Option<String>,
    pub tel: Option<String>,
    pub cat1: Option<String>,
    pub cat2: Option<String>,
    pub cat3: Option<String>,
    pub area_code: Option<String>,
    pub sigungu_code: Option<String>,
    pub modified_time: Option<String>,
}

impl ListingRecord {
    #[must_use]
    pub fn position(&self) -> Option<Coordinates> {
        tourmap_core::normalize(self.map_x.as_deref(), self.map_y.as_deref())
    }

    #[must_use]
    pub fn modified_at(&self) -> Option<NaiveDateTime> {
        self.modified_time.as_deref().and_then(parse_modified_time)
    }

    /// `addr1` and `addr2` joined with a space, if any address is present.
    #[must_use]
    pub fn full_address(&self) -> Option<String> {
        match (self.addr1.as_deref(), self.addr2.as_deref()) {
            (Some(a), Some(b)) => Some(format!("{a} {b}")),
            (Some(a), None) | (None, Some(a)) => Some(a.to_owned()),
            (None, None) => None,
        }
    }
}

/// Pet-travel attributes for one content id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PetPolicy {
    pub content_id: String,
    pub accompaniment_type: Option<String>,
    pub allowed_scope: Option<String>,
    pub requirements: Option<String>,
    pub extra_info: Option<String>,
    pub related_facilities: Option<String>,
}

impl PetPolicy {
    /// Pets are allowed when an accompaniment type is published and it does
    /// not say "not allowed".
    #[must_use]
    pub fn allows_accompaniment(&self) -> bool {
        self.accompaniment_type
            .as_deref()
            .is_some_and(|t| !t.contains(NOT_ALLOWED_MARKER))
    }

    /// `true` when any tag is a substring of the accompaniment type or the
    /// extra-info field. An empty tag list matches everything.
    #[must_use]
    pub fn matches_size<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        if tags.is_empty() {
            return true;
        }
        let fields = [self.accompaniment_type.as_deref(), self.extra_info.as_deref()];
        tags.iter().any(|tag| {
            let tag = tag.as_ref();
            fields.iter().flatten().any(|field| field.contains(tag))
        })
    }
}

/// Parses `modifiedtime`. TourAPI sends `YYYYMMDDhhmmss`; RFC 3339 and plain
/// `YYYY-MM-DD` are accepted for records that came through other sources.
#[must_use]
pub fn parse_modified_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[must_use]
pub fn normalize_listing(raw: RawListingItem) -> ListingRecord {
    ListingRecord {
        content_type: raw
            .contenttypeid
            .as_deref()
            .map_or(ContentType::Unknown, ContentType::from_code),
        content_id: raw.contentid,
        title: raw.title.unwrap_or_default(),
        addr1: raw.addr1,
        addr2: raw.addr2,
        map_x: raw.mapx,
        map_y: raw.mapy,
        first_image: raw.firstimage,
        first_image2: raw.firstimage2,
        tel: raw.tel,
        cat1: raw.cat1,
        cat2: raw.cat2,
        cat3: raw.cat3,
        area_code: raw.areacode,
        sigungu_code: raw.sigungucode,
        modified_time: raw.modifiedtime,
    }
}

#[must_use]
pub fn normalize_pet_policy(raw: RawPetTourItem) -> PetPolicy {
    PetPolicy {
        content_id: raw.contentid,
        accompaniment_type: raw.acmpy_type_cd,
        allowed_scope: raw.acmpy_psbl_cpam,
        requirements: raw.acmpy_need_mtr,
        extra_info: raw.etc_acmpy_info,
        related_facilities: raw.rela_poses_fclty,
    }
}

/// Decodes listing rows one by one, skipping any that fail to deserialize.
pub(crate) fn listing_records(values: Vec<Value>, context: &str) -> Vec<ListingRecord> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, v)| {
            serde_json::from_value::<RawListingItem>(v)
                .map_err(|e| {
                    tracing::warn!(context, index = idx, error = %e, "skipping malformed listing item");
                })
                .ok()
        })
        .map(normalize_listing)
        .collect()
}
