//! Booking domain module
//!
//! Models, the negotiation state machine, and the service exposing booking
//! operations to handlers.

mod model;
pub mod negotiation;
mod service;

pub use model::*;
pub use negotiation::{Mutation, Transition};
pub use service::BookingService;
