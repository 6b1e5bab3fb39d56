use serde::{Deserialize, Serialize};
use std::fmt;

/// A money amount in the smallest unit of its currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// ISO currency code, e.g. `GBP`
    pub currency: String,
    /// Amount in minor units (pence, cents)
    pub units: i64,
}

impl Amount {
    pub fn new(currency: &str, units: i64) -> Self {
        Self {
            currency: currency.to_string(),
            units,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.currency.is_empty() && self.units == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.units, self.currency)
    }
}
