//! Banner ad data source
//!
//! Loads the complete banner creative set from the provider's `bannerads`
//! lookup and keys it by placement id.

use serde::Deserialize;

use crate::broker::DataSource;
use crate::config::{ConfigError, ProviderConfig};
use crate::endpoint::EndpointDescriptor;

use super::BannerAd;

/// Name this source reports to logs and instrumentation
pub const SOURCE_NAME: &str = "BannerAdData";

/// Path segment of the banner ad lookup
const PATH_SEGMENT: &str = "bannerads";

/// Query marking website-scoped lookups
const WEBSITE_QUERY: &str = "website=1";

/// Wire shape of the banner ad lookup response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerAdList {
    /// Every banner creative currently served
    pub banner_ads: Vec<BannerAd>,
}

/// Source for the banner ad cache
#[derive(Debug, Clone, Copy, Default)]
pub struct BannerAdSource;

impl BannerAdSource {
    /// Creates the banner ad source
    pub fn new() -> Self {
        Self
    }
}

impl DataSource for BannerAdSource {
    type Key = String;
    type Record = BannerAd;
    type Payload = BannerAdList;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError> {
        Ok(config
            .base_endpoint()?
            .with_segment(PATH_SEGMENT)
            .with_query(WEBSITE_QUERY))
    }

    fn extract_records(&self, payload: BannerAdList) -> Vec<(String, BannerAd)> {
        payload
            .banner_ads
            .into_iter()
            .map(|ad| (ad.placement_id.clone(), ad))
            .collect()
    }
}
