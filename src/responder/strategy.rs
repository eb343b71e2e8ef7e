//! Reply policy for the scripted technician

use crate::estimator::{Estimate, EstimatorError};
use crate::pricing::{price_range, ServiceCategory};

/// Largest counter-offer discount, in percent of the current proposal, that is
/// agreed to outright.
const COUNTER_ACCEPT_THRESHOLD_PERCENT: i64 = 15;

/// A technician utterance and the price it puts on the table, if any
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Greeting,
    OpeningQuote {
        price: i64,
        explanation: String,
        tips: Option<String>,
    },
    EstimateUnavailable {
        price: i64,
    },
    AgreeToCounter {
        price: i64,
    },
    SplitDifference {
        offered: i64,
        price: i64,
        district: String,
    },
}

impl Reply {
    pub fn price(&self) -> Option<i64> {
        match self {
            Reply::Greeting => None,
            Reply::OpeningQuote { price, .. }
            | Reply::EstimateUnavailable { price }
            | Reply::AgreeToCounter { price }
            | Reply::SplitDifference { price, .. } => Some(*price),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Reply::Greeting => {
                "Namaste! Thanks for choosing me. How can I help you today? \
                 Tell me about the problem and I'll share a quote."
                    .to_string()
            }
            Reply::OpeningQuote {
                price,
                explanation,
                tips,
            } => {
                let mut text = format!(
                    "Thanks for the details. I can take this job for ₹{}. {}",
                    price, explanation
                );
                if let Some(tip) = tips {
                    text.push_str(&format!("\nTip: {}", tip));
                }
                text
            }
            Reply::EstimateUnavailable { price } => format!(
                "Sorry, I couldn't work out a detailed estimate right now. My starting rate for \
                 this job is ₹{}; we can adjust it once I see the work.",
                price
            ),
            Reply::AgreeToCounter { price } => format!(
                "Alright, I agree to ₹{}. It's a fair price for the work. \
                 You can proceed to confirm the booking now.",
                price
            ),
            Reply::SplitDifference {
                offered,
                price,
                district,
            } => format!(
                "₹{} is a bit low considering the effort and travel to {}. \
                 How about we settle at ₹{}? This is my best offer.",
                offered, district, price
            ),
        }
    }
}

/// Answer a customer counter-offer below the current proposal.
///
/// Within the threshold the counter is agreed verbatim; beyond it the reply
/// proposes the floor of the midpoint. The comparison is done in integers so the
/// threshold itself is inclusive.
pub fn counter_reply(current: i64, counter: i64, district: &str) -> Reply {
    if (current - counter) * 100 <= COUNTER_ACCEPT_THRESHOLD_PERCENT * current {
        Reply::AgreeToCounter { price: counter }
    } else {
        Reply::SplitDifference {
            offered: counter,
            price: (current + counter).div_euclid(2),
            district: district.to_string(),
        }
    }
}

/// First quote from an estimator outcome, clamped into the category's window.
/// Any failure or unreadable range falls back to the window's minimum.
pub fn opening_quote(
    category: &ServiceCategory,
    estimate: Result<&Estimate, &EstimatorError>,
) -> Reply {
    let range = price_range(category);

    match estimate {
        Ok(estimate) => match estimate.suggested_price() {
            Some(price) => Reply::OpeningQuote {
                price: range.clamp(price),
                explanation: estimate.explanation.trim().to_string(),
                tips: Some(estimate.tips.trim().to_string()).filter(|t| !t.is_empty()),
            },
            None => Reply::EstimateUnavailable { price: range.min },
        },
        Err(_) => Reply::EstimateUnavailable { price: range.min },
    }
}
