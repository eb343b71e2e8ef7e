//! Allowed negotiation window per service category

use serde::Serialize;

use super::ServiceCategory;

/// Inclusive price bounds in whole rupees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Window for trades without a dedicated row; permissive on purpose.
pub const DEFAULT_PRICE_RANGE: PriceRange = PriceRange { min: 100, max: 2000 };

impl PriceRange {
    pub fn contains(&self, price: i64) -> bool {
        price >= self.min && price <= self.max
    }

    pub fn clamp(&self, price: i64) -> i64 {
        price.clamp(self.min, self.max)
    }
}

pub fn price_range(category: &ServiceCategory) -> PriceRange {
    match category {
        ServiceCategory::Electrician
        | ServiceCategory::Plumber
        | ServiceCategory::Carpenter
        | ServiceCategory::Painter => PriceRange { min: 500, max: 1500 },
        ServiceCategory::AcRepair => PriceRange { min: 1000, max: 1500 },
        ServiceCategory::Maid => PriceRange { min: 500, max: 800 },
        ServiceCategory::CarWash | ServiceCategory::Haircut => PriceRange { min: 100, max: 250 },
        ServiceCategory::Other(_) => DEFAULT_PRICE_RANGE,
    }
}
