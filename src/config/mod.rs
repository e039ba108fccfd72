//! Configuration module for Source-Watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The same file carries the source catalog as `[[source]]` entries.
//!
//! # Example
//!
//! ```no_run
//! use source_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sources.toml")).unwrap();
//! println!("Retries per request: {}", config.fetch.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, HealthConfig, OutputConfig, SourceEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
