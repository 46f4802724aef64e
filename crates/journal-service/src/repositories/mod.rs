//! Database repositories.

pub mod entries;

pub use entries::EntriesRepository;
