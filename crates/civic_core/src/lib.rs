pub mod analytics;
pub mod categorizer;
pub mod db;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod ranking;
pub mod schema;
pub mod scoring;

pub use error::{CivicError, CivicResult};
