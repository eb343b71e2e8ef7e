//! Estimate payload and range parsing

use serde::{Deserialize, Serialize};

/// Estimator answer, as the model is asked to format it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Free text such as "₹450 - ₹700"
    pub estimated_range: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tips: String,
}

impl Estimate {
    /// Single price suggested by the range: the floored midpoint of the first
    /// two amounts, or the only amount given. A midpoint that does not fit in an
    /// `i64` counts as unreadable.
    pub fn suggested_price(&self) -> Option<i64> {
        match parse_amounts(&self.estimated_range).as_slice() {
            [] => None,
            [only] => Some(*only),
            [low, high, ..] => low.checked_add(*high).map(|sum| sum.div_euclid(2)),
        }
    }
}

/// Whole-rupee amounts in the order they appear. Thousands separators are
/// accepted and paise are dropped.
pub fn parse_amounts(text: &str) -> Vec<i64> {
    let chars: Vec<char> = text.chars().collect();
    let mut amounts = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let mut digits = String::new();
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() {
                digits.push(c);
                i += 1;
            } else if c == ',' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
                i += 1;
            } else {
                break;
            }
        }

        if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }

        if let Ok(amount) = digits.parse::<i64>() {
            amounts.push(amount);
        }
    }

    amounts
}
