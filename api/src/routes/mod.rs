//! API Routes

pub mod health;
pub mod schema;
pub mod submissions;
