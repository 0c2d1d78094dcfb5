//! CLI command handlers

pub mod browse;
pub mod commands;

pub use browse::browse;
pub use commands::{columns, export, files, sheets, show, upload};
