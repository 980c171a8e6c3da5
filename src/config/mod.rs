//! Configuration module for Page Inspector
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All sections are optional, so an empty file (or `Config::default()`) yields a
//! working configuration.
//!
//! # Example
//!
//! ```no_run
//! use page_inspector::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("inspector.toml")).unwrap();
//! println!("Page fetch timeout: {}s", config.fetcher.timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, OutputConfig, UserAgentConfig, ValidatorConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
