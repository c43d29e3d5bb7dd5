//! Client-side ordering of a batch.
//!
//! Both orders are stable: records that compare equal keep the order the
//! remote returned them in.

use std::cmp::Reverse;

use tourmap_core::SortMode;
use tourmap_tourapi::ListingRecord;

pub fn sort_records(items: &mut [ListingRecord], mode: SortMode) {
    match mode {
        SortMode::Default => {}
        // Case-folded so "seoul" and "Seoul" sort together.
        SortMode::Name => items.sort_by_cached_key(|r| r.title.to_lowercase()),
        // Newest first; missing or unparsable timestamps sink to the end.
        SortMode::Latest => items.sort_by_cached_key(|r| {
            let modified = r.modified_at();
            (modified.is_none(), Reverse(modified))
        }),
    }
}
