//! # Shipping Rate Resolver
//!
//! Picks the shipping charge for an order from the rate found for its
//! `(country, region)`, or the default when there is none. A missing
//! rate never blocks checkout.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::ShippingRate;

/// Charged when no rate is configured for the destination (10.00).
pub const DEFAULT_SHIPPING_RATE_CENTS: i64 = 1000;

/// The shipping charge chosen for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub rate_cents: i64,
    /// `None` when the default rate was used.
    pub shipping_id: Option<String>,
}

impl ShippingQuote {
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }

    pub fn is_default(&self) -> bool {
        self.shipping_id.is_none()
    }
}

impl Default for ShippingQuote {
    fn default() -> Self {
        Self {
            rate_cents: DEFAULT_SHIPPING_RATE_CENTS,
            shipping_id: None,
        }
    }
}

/// Builds the quote from a looked-up rate. Absent or negative rates fall
/// back to the default.
pub fn quote(rate: Option<&ShippingRate>) -> ShippingQuote {
    match rate {
        Some(r) if r.rate_cents >= 0 => ShippingQuote {
            rate_cents: r.rate_cents,
            shipping_id: Some(r.id.clone()),
        },
        _ => ShippingQuote::default(),
    }
}

/// Lookup key for a destination: both parts trimmed.
pub fn destination_key<'a>(country: &'a str, region: &'a str) -> (&'a str, &'a str) {
    (country.trim(), region.trim())
}
