use chrono::{DateTime, Utc};
use soe_common::Money;

use crate::db_types::ProductListing;

/// Resolves the unit price a buyer pays for the listing at the given instant.
///
/// The discounted price applies when the listing carries one and the discount window covers
/// `now`. A missing window bound is treated as open on that side. The result is what gets frozen
/// into the order line item; it is never recomputed after placement.
pub fn effective_unit_price(listing: &ProductListing, now: DateTime<Utc>) -> Money {
    let Some(discount_price) = listing.discount_price else {
        return listing.price;
    };
    let started = listing.discount_start_time.map(|t| t <= now).unwrap_or(true);
    let not_ended = listing.discount_end_time.map(|t| now <= t).unwrap_or(true);
    if started && not_ended {
        discount_price
    } else {
        listing.price
    }
}
