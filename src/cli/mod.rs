//! CLI subcommand implementations for the imgharvest binary.

pub mod bundle_cmd;
pub mod discover_cmd;
pub mod serve_cmd;
