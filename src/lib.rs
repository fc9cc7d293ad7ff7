//! Ad-serving lookup cache library
//!
//! Keeps in-memory lookup caches for ad-serving data (banner ads, video ads,
//! suppliers, currency exchange rates) fresh by pulling complete datasets from
//! a remote data provider and publishing them with atomic snapshot swaps.
//! Readers always see a complete dataset; a failed refresh never disturbs the
//! snapshot already being served.

pub mod broker;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod endpoint;
pub mod instrument;
pub mod refresh;
pub mod remote;
