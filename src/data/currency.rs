//! Currency rate data source
//!
//! Loads EUR reference exchange rates from the provider's `eurref` lookup and
//! keys them by ISO 4217 currency code. Rates convert supplier bids into the
//! exchange's accounting currency.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::broker::DataSource;
use crate::config::{ConfigError, ProviderConfig};
use crate::endpoint::EndpointDescriptor;

use super::ExchangeRate;

/// Name this source reports to logs and instrumentation
pub const SOURCE_NAME: &str = "CurrencyRateData";

/// Path segment of the EUR reference rate lookup
const PATH_SEGMENT: &str = "eurref";

/// Wire shape of the EUR reference rate lookup response
#[derive(Debug, Deserialize)]
pub struct CurrencyRates {
    /// Base currency the rates convert from
    pub base: String,
    /// Day the reference rates were fixed
    pub date: NaiveDate,
    /// Rate per target currency code
    pub rates: HashMap<String, f64>,
}

/// Source for the exchange rate cache
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyRateSource;

impl CurrencyRateSource {
    /// Creates the currency rate source
    pub fn new() -> Self {
        Self
    }
}

impl DataSource for CurrencyRateSource {
    type Key = String;
    type Record = ExchangeRate;
    type Payload = CurrencyRates;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError> {
        Ok(config.base_endpoint()?.with_segment(PATH_SEGMENT))
    }

    fn extract_records(&self, payload: CurrencyRates) -> Vec<(String, ExchangeRate)> {
        let date = payload.date;
        payload
            .rates
            .into_iter()
            .map(|(currency, rate)| {
                let record = ExchangeRate {
                    currency: currency.clone(),
                    rate,
                    date,
                };
                (currency, record)
            })
            .collect()
    }
}
