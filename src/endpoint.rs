//! Request endpoint composition for the data provider API
//!
//! This module describes provider endpoints as an authority plus ordered path
//! segments plus an optional query string. Brokers extend the configured base
//! descriptor with data-kind-specific segments before handing it to the fetcher.

/// Describes one provider endpoint without performing any I/O.
///
/// The descriptor is built once per refresh cycle from configuration, so a
/// configuration change is picked up by the next cycle without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Scheme, host and optional port, e.g. `https://data.example.com:8443`
    authority: String,
    /// Ordered path segments appended below the authority
    segments: Vec<String>,
    /// Query string without the leading `?`, e.g. `website=1`
    query: Option<String>,
}

impl EndpointDescriptor {
    /// Creates a descriptor rooted at the given authority
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            segments: Vec::new(),
            query: None,
        }
    }

    /// Appends a path segment below the current path
    ///
    /// Slashes at either end of the segment are trimmed, so configured
    /// multi-part segments like `ssp-data-provider/lookup` compose cleanly.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        let trimmed = segment.trim_matches('/');
        if !trimmed.is_empty() {
            self.segments.push(trimmed.to_string());
        }
        self
    }

    /// Sets the query string (without the leading `?`)
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Renders the full request URL
    pub fn url(&self) -> String {
        let mut url = self.authority.trim_end_matches('/').to_string();
        for segment in &self.segments {
            url.push('/');
            url.push_str(segment);
        }
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_only() {
        let endpoint = EndpointDescriptor::new("https://data.example.com");
        assert_eq!(endpoint.url(), "https://data.example.com");
    }

    #[test]
    fn test_segments_compose_in_order() {
        let endpoint = EndpointDescriptor::new("https://data.example.com")
            .with_segment("ssp-data-provider/lookup")
            .with_segment("bannerads");
        assert_eq!(
            endpoint.url(),
            "https://data.example.com/ssp-data-provider/lookup/bannerads"
        );
    }

    #[test]
    fn test_query_is_appended_last() {
        let endpoint = EndpointDescriptor::new("http://localhost:8080")
            .with_segment("ssp-data-provider/lookup")
            .with_segment("bannerads")
            .with_query("website=1");
        assert_eq!(
            endpoint.url(),
            "http://localhost:8080/ssp-data-provider/lookup/bannerads?website=1"
        );
    }

    #[test]
    fn test_redundant_slashes_are_normalized() {
        let endpoint = EndpointDescriptor::new("https://data.example.com/")
            .with_segment("/lookup/")
            .with_segment("supplier");
        assert_eq!(endpoint.url(), "https://data.example.com/lookup/supplier");
    }

    #[test]
    fn test_empty_segment_is_ignored() {
        let endpoint = EndpointDescriptor::new("https://data.example.com")
            .with_segment("")
            .with_segment("eurref");
        assert_eq!(endpoint.url(), "https://data.example.com/eurref");
    }

    #[test]
    fn test_authority_with_port() {
        let endpoint = EndpointDescriptor::new("http://127.0.0.1:9090")
            .with_segment("lookup");
        assert_eq!(endpoint.url(), "http://127.0.0.1:9090/lookup");
    }
}
