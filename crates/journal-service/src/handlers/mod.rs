//! HTTP request handlers.

pub mod entries;
pub mod health;
pub mod metrics;

pub use entries::{
    create_entry, delete_entry, get_entry, list_entries, summarize_entry, update_entry,
};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
