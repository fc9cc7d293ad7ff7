//! Video ad data source
//!
//! Loads the video creative set from the provider's `videoads` lookup and
//! keys it by placement id.

use serde::Deserialize;

use crate::broker::DataSource;
use crate::config::{ConfigError, ProviderConfig};
use crate::endpoint::EndpointDescriptor;

use super::VideoAd;

/// Name this source reports to logs and instrumentation
pub const SOURCE_NAME: &str = "VideoAdData";

/// Path segment of the video ad lookup
const PATH_SEGMENT: &str = "videoads";

/// Query marking website-scoped lookups
const WEBSITE_QUERY: &str = "website=1";

/// Wire shape of the video ad lookup response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAdList {
    /// Every video creative currently served
    pub video_ads: Vec<VideoAd>,
}

/// Source for the video ad cache
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoAdSource;

impl VideoAdSource {
    /// Creates the video ad source
    pub fn new() -> Self {
        Self
    }
}

impl DataSource for VideoAdSource {
    type Key = String;
    type Record = VideoAd;
    type Payload = VideoAdList;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError> {
        Ok(config
            .base_endpoint()?
            .with_segment(PATH_SEGMENT)
            .with_query(WEBSITE_QUERY))
    }

    fn extract_records(&self, payload: VideoAdList) -> Vec<(String, VideoAd)> {
        payload
            .video_ads
            .into_iter()
            .map(|ad| (ad.placement_id.clone(), ad))
            .collect()
    }
}
