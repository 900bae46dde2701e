//! CLI Commands

pub mod config;
pub mod fill;
pub mod schema;
pub mod scrape;
pub mod validate;
