//! HTTP API, alert checking, and background scheduling for PriceNest.

pub mod alerts;
pub mod api;
pub mod middleware;
pub mod notify;
pub mod scheduler;
