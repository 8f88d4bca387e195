//! # occam
//!
//! Transport and configuration layer around `occam-core`: the HTTP API, the
//! CLI, and the TOML/environment configuration they share.

pub mod api;
pub mod cli;
pub mod config;
