//! Middleware components for the health server

pub mod logging;
