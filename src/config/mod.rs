//! Exporter configuration
//!
//! Loaded from a TOML file and validated before any session is opened.

pub mod error;
pub mod loader;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use types::{Config, HomeserverConfig};
