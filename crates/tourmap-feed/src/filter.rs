use std::collections::BTreeSet;

use tourmap_core::{AreaCode, ContentType, SortMode};
use tourmap_tourapi::ListingQuery;

/// The current query shape.
///
/// Any change handed to the controller invalidates the page cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub region: Option<AreaCode>,
    /// Selected categories; empty means all.
    pub categories: BTreeSet<ContentType>,
    pub sort: SortMode,
    /// Keep only records whose pet policy allows accompaniment.
    pub pets_only: bool,
    /// Size tags (e.g. `"소형"`) refining `pets_only`; ignored when it is off.
    pub pet_sizes: Vec<String>,
}

impl FilterState {
    #[must_use]
    pub fn with_region(mut self, region: AreaCode) -> Self {
        self.region = Some(region);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: ContentType) -> Self {
        self.categories.insert(category);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_pets<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pets_only = true;
        self.pet_sizes = sizes
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty())
            .collect();
        self
    }

    /// The remote accepts one `contentTypeId`; it is only sent when exactly
    /// one category is selected.
    #[must_use]
    pub fn remote_content_type(&self) -> Option<&'static str> {
        match self.categories.len() {
            1 => self.categories.iter().next().and_then(|ct| ct.code()),
            _ => None,
        }
    }

    /// Narrowed locally whenever the selection cannot be sent as a single
    /// `contentTypeId`: several categories, or one without a remote code.
    #[must_use]
    pub fn needs_local_category_filter(&self) -> bool {
        !self.categories.is_empty() && self.remote_content_type().is_none()
    }

    #[must_use]
    pub fn matches_category(&self, content_type: ContentType) -> bool {
        self.categories.is_empty() || self.categories.contains(&content_type)
    }

    /// Size tags in effect: empty unless `pets_only` is set.
    #[must_use]
    pub fn effective_pet_sizes(&self) -> &[String] {
        if self.pets_only {
            &self.pet_sizes
        } else {
            &[]
        }
    }

    #[must_use]
    pub fn listing_query(&self, page_no: u32, page_size: u32) -> ListingQuery {
        ListingQuery {
            area_code: self.region.as_ref().map(|r| r.as_str().to_owned()),
            content_type_id: self.remote_content_type().map(str::to_owned),
            arrange: self.sort.arrange_param(),
            page_no,
            num_of_rows: page_size,
        }
    }
}
