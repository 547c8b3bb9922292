//! Signup Locator - Data-driven locator catalog for the sign-up form checker.
//!
//! Every semantic element on the page (language toggle, name input, terms
//! checkbox, ...) is described by a priority-ordered list of selection
//! strategies. The lists live in TOML: a builtin catalog compiled into the
//! crate, optionally overlaid by a user file or directory.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): roles, strategies and candidate lists
//! - **Loader** ([`loader`]): user catalog loading from a file or directory
//! - **Catalog** ([`catalog`]): immutable role lookup built once at startup
//! - **Errors** ([`error`]): catalog-specific error types
//!
//! # Example
//!
//! ```rust
//! use signup_locator::{LocatorCatalog, Role};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = LocatorCatalog::builtin()?;
//!
//! for locator in catalog.locators(Role::LanguageToggle) {
//!     println!("toggle candidate: {locator}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
pub mod definition;
pub mod error;
pub mod loader;

// Re-export commonly used types
pub use catalog::{CatalogFile, LocatorCatalog};
pub use definition::{CandidateList, MergeMode, Role, Strategy};
pub use error::{CatalogError, Result};
pub use loader::CatalogLoader;
