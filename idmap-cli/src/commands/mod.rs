//! CLI command implementations.

pub mod connect;
pub mod ingest;
pub mod ping;
pub mod query;
