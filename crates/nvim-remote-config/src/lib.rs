//! Configuration parsing for nvim-remote
//!
//! This crate handles parsing the KDL settings file: connection settings,
//! log level, and named floating-window layouts.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
