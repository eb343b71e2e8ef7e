//! API handlers for the FixMate backend

pub mod admin;
pub mod bookings;
pub mod health;
pub mod technicians;

pub use admin::*;
pub use bookings::*;
pub use health::*;
pub use technicians::*;
