//! Pricing rules for negotiated bookings
//!
//! Two stateless layers that negotiation consults independently: the per-category
//! price window a proposal must fall into, and the tiered platform fee charged on
//! whatever price is finally agreed.

mod category;
mod fee;
mod range;

pub use category::ServiceCategory;
pub use fee::{fee_rate_bps, fee_rate_percent, format_rupees, platform_fee};
pub use range::{price_range, PriceRange, DEFAULT_PRICE_RANGE};
