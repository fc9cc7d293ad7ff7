//! Supplier data source
//!
//! Loads the set of connected demand partners from the provider's `supplier`
//! lookup and keys it by supplier id. Suppliers bid in their own currencies,
//! so this source can be wired to request a currency rate refresh right after
//! each published supplier snapshot.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::broker::DataSource;
use crate::config::{ConfigError, ProviderConfig};
use crate::data::currency;
use crate::endpoint::EndpointDescriptor;
use crate::refresh::RefreshRequest;

use super::Supplier;

/// Name this source reports to logs and instrumentation
pub const SOURCE_NAME: &str = "SupplierData";

/// Path segment of the supplier lookup
const PATH_SEGMENT: &str = "supplier";

/// Wire shape of the supplier lookup response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierList {
    /// Every demand partner currently connected
    pub suppliers: Vec<Supplier>,
}

/// Source for the supplier cache
#[derive(Debug, Default)]
pub struct SupplierSource {
    requests: Option<mpsc::Sender<RefreshRequest>>,
}

impl SupplierSource {
    /// Creates the supplier source without refresh chaining
    pub fn new() -> Self {
        Self { requests: None }
    }

    /// Requests a currency rate refresh after each published supplier snapshot
    pub fn with_rate_chaining(mut self, requests: mpsc::Sender<RefreshRequest>) -> Self {
        self.requests = Some(requests);
        self
    }
}

#[async_trait]
impl DataSource for SupplierSource {
    type Key = String;
    type Record = Supplier;
    type Payload = SupplierList;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError> {
        Ok(config.base_endpoint()?.with_segment(PATH_SEGMENT))
    }

    fn extract_records(&self, payload: SupplierList) -> Vec<(String, Supplier)> {
        payload
            .suppliers
            .into_iter()
            .map(|supplier| (supplier.supplier_id.clone(), supplier))
            .collect()
    }

    async fn after_swap(&self) {
        let Some(requests) = &self.requests else {
            return;
        };
        // try_send keeps the hook from ever blocking a refresh cycle
        let request = RefreshRequest::new(currency::SOURCE_NAME);
        if requests.try_send(request).is_err() {
            warn!(source = SOURCE_NAME, "currency refresh request dropped");
        }
    }
}
