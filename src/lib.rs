//! FixMate Backend Library
//!
//! Booking and price negotiation between customers and local technicians:
//! fee tiers and price windows, the negotiation state machine, a scripted
//! technician backed by a cost estimator, and the HTTP surface over them.

pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod estimator;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod responder;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod technician;
