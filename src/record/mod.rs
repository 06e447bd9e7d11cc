//! Normalized class record types
//!
//! This module defines the common record shape every provider normalizes
//! into, including the optional enrichment substructure, plus the
//! structural validation gate applied before any record enters the store.

mod validate;

pub use validate::validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single fitness-class occurrence, normalized from a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub name: String,
    pub description: String,
    /// Absolute start time; providers resolve any local-time quirks
    /// before handing records to the pipeline.
    pub start_time: DateTime<Utc>,
    pub location: Location,
    pub trainer: String,
    /// Effort rating on a 1-10 scale
    pub intensity: u8,
    pub price: f64,
    pub booking_url: String,
    /// The provider's own identifier for this class occurrence
    pub provider_record_id: String,
    pub provider_name: String,
    pub capacity: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

impl ClassRecord {
    /// The identity used for duplicate admission: exact match on
    /// (provider_record_id, start_time). Two reports of the same logical
    /// class with timestamps differing by even a millisecond count as
    /// distinct records.
    pub fn identity(&self) -> (&str, &DateTime<Utc>) {
        (&self.provider_record_id, &self.start_time)
    }
}

/// Venue location for a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Optional per-class extras some providers expose
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_photo_url: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spots_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pricing_tiers: Vec<PricingTier>,
}

/// Maximum number of photo URLs a record may carry
pub const MAX_PHOTO_URLS: usize = 5;

/// A structured pricing option (drop-in, pack, membership, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    pub label: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<u32>,
}

/// Real-time booking availability for a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Open,
    Closed,
    Full,
    Waitlist,
}
