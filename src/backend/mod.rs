//! Content backend access: query encoding, HTTP transport and response shapes

pub mod client;
pub mod query;
pub mod wire;

pub use client::{ContentBackend, StrapiClient};
pub use query::StrapiQuery;
