//! Request middleware: authentication and HTTP metrics.

pub mod auth;
pub mod http_metrics;
