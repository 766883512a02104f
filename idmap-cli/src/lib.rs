//! idmap CLI - Command-line interface for idmap.
//!
//! This crate provides the `idmap` tool for checking database connectivity,
//! running ad-hoc queries and loading mapping files.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
