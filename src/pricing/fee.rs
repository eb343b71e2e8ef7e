//! Tiered platform fee
//!
//! The rate is chosen from the tier the whole price falls into and applied to the
//! whole price; it is not a marginal schedule. Prices 280 and 290..=299 carry legacy
//! promotional rates that must stay exactly as listed.

/// Fee rate in basis points (1/100 of a percent) for a price in whole rupees.
pub fn fee_rate_bps(price: i64) -> i64 {
    match price {
        i64::MIN..=249 => 250,
        280 => 273,
        290..=299 => 293,
        250..=450 => 300,
        451..=700 => 500,
        701..=1000 => 800,
        1001..=1500 => 1000,
        _ => 1200,
    }
}

pub fn fee_rate_percent(price: i64) -> f64 {
    fee_rate_bps(price) as f64 / 100.0
}

/// Platform fee retained on `price`, unrounded.
///
/// Callers reject negative prices before getting here.
pub fn platform_fee(price: i64) -> f64 {
    price as f64 * fee_rate_bps(price) as f64 / 10_000.0
}

/// Two-decimal presentation used in booking details.
pub fn format_rupees(amount: f64) -> String {
    format!("₹{:.2}", amount)
}
