//! Scripted technician replies
//!
//! `strategy` decides what the technician says and which price comes with it;
//! `bridge` runs the cost estimator with a deadline and feeds the result to the
//! strategy.

mod bridge;
mod strategy;

pub use bridge::AutoResponder;
pub use strategy::{counter_reply, Reply};
