//! Core data models for the ad-serving lookup caches
//!
//! This module contains the record types cached per data kind together with
//! one submodule per kind holding its wire DTOs and refresh source. Records
//! double as the wire item shape; list payloads wrap them per kind.

pub mod banner;
pub mod currency;
pub mod supplier;
pub mod video;

pub use banner::BannerAdSource;
pub use currency::CurrencyRateSource;
pub use supplier::SupplierSource;
pub use video::VideoAdSource;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A banner creative servable on one placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerAd {
    /// Placement this creative belongs to
    pub placement_id: String,
    /// Creative markup delivered to the page
    pub markup: String,
    /// Creative width in pixels
    pub width: u32,
    /// Creative height in pixels
    pub height: u32,
    /// Price per thousand impressions
    pub price_cpm: f64,
    /// ISO 4217 currency of the price
    pub currency: String,
}

/// A video creative servable on one placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAd {
    /// Placement this creative belongs to
    pub placement_id: String,
    /// URL of the VAST document describing the creative
    pub vast_url: String,
    /// Creative duration in seconds
    pub duration: u32,
    /// Encoded bitrate in kbit/s
    pub bitrate: u32,
    /// Price per thousand impressions
    pub price_cpm: f64,
}

/// A demand partner connected to the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// Unique identifier of the supplier
    pub supplier_id: String,
    /// Human-readable supplier name
    pub name: String,
    /// Bid endpoint URL of the supplier
    pub endpoint: String,
    /// ISO 4217 currency the supplier bids in
    pub currency: String,
    /// Maximum time in milliseconds to wait for the supplier's bid
    pub tmax: u32,
}

/// EUR reference exchange rate for one currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// ISO 4217 code of the target currency
    pub currency: String,
    /// Units of the target currency per EUR
    pub rate: f64,
    /// Day the reference rate was fixed
    pub date: NaiveDate,
}
