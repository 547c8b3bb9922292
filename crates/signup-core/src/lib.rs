//! Signup Core - Foundation crate for the sign-up form checker.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the driver, locator, discovery and flow crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared enums (`Scope`, `FieldRole`)
//!
//! # Example
//!
//! ```rust
//! use signup_core::{AppConfig, Scope};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! assert_eq!(Scope::Frame(2).to_string(), "frame[2]");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CatalogConfig, LanguageConfig, OutcomeConfig, ProfileConfig,
    ReportConfig, TargetConfig, TimingConfig,
};
pub use error::{ConfigError, ConfigResult, Result, SignupError};
pub use types::{FieldRole, Scope};
