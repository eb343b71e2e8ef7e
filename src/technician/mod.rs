//! Technician directory
//!
//! Profiles customers pick from when opening a booking, plus the admin
//! verification flow.

mod model;
mod service;

pub use model::*;
pub use service::{TechnicianService, DEFAULT_RATING};
