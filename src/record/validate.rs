//! Structural validation for candidate records
//!
//! Every candidate passes through `validate` before it is allowed into the
//! pipeline. Rejection is a routine outcome, not an error: the function
//! returns false and the caller drops the record silently.

use crate::record::{ClassRecord, MAX_PHOTO_URLS};

/// Checks a candidate record against the structural and range invariants.
///
/// Pure function with no side effects; it gates all downstream writes.
/// Returns false when any of the following holds:
/// - a required string field is empty
/// - latitude outside [-90, 90] or longitude outside [-180, 180]
/// - intensity outside [1, 10]
/// - price negative or non-finite
/// - more than 5 photo URLs, or a negative-priced pricing tier
pub fn validate(record: &ClassRecord) -> bool {
    if record.name.trim().is_empty()
        || record.description.trim().is_empty()
        || record.trainer.trim().is_empty()
        || record.booking_url.trim().is_empty()
        || record.provider_record_id.trim().is_empty()
        || record.provider_name.trim().is_empty()
    {
        return false;
    }

    let loc = &record.location;
    if loc.name.trim().is_empty() || loc.address.trim().is_empty() {
        return false;
    }
    if !loc.latitude.is_finite() || !(-90.0..=90.0).contains(&loc.latitude) {
        return false;
    }
    if !loc.longitude.is_finite() || !(-180.0..=180.0).contains(&loc.longitude) {
        return false;
    }

    if !(1..=10).contains(&record.intensity) {
        return false;
    }

    if !record.price.is_finite() || record.price < 0.0 {
        return false;
    }

    if let Some(enrichment) = &record.enrichment {
        if enrichment.photo_urls.len() > MAX_PHOTO_URLS {
            return false;
        }
        if enrichment
            .pricing_tiers
            .iter()
            .any(|tier| !tier.price.is_finite() || tier.price < 0.0)
        {
            return false;
        }
    }

    true
}
