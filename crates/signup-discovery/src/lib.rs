//! Signup Discovery - Resilient element discovery and interaction.
//!
//! Builds on a [`signup_driver::Driver`] session and a
//! [`signup_locator::LocatorCatalog`] to find form elements on a page whose
//! markup is not known in advance: candidates are tried in priority order,
//! in the top document and then in each frame, with bounded polling and
//! fallbacks for obstructed clicks.
//!
//! # Architecture
//!
//! - **Polling** ([`poll`]): the single bounded-wait primitive
//! - **Scopes** ([`scope`]): frame switching that always ends at the top document
//! - **Finder** ([`finder`]): visibility-gated lookup by role
//! - **Interaction** ([`interact`]): clicks, typing and checkboxes with fallbacks
//! - **Dropdowns** ([`dropdown`]): custom widget and native select protocol
//! - **Outcome** ([`outcome`]): post-submit classification
//! - **Readiness** ([`ready`]): document settle and form location
//! - **Engine** ([`engine`]): components wired from configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use signup_core::{OutcomeConfig, TimingConfig};
//! use signup_discovery::DiscoveryEngine;
//! use signup_driver::WebDriverSession;
//! use signup_locator::{LocatorCatalog, Role};
//!
//! # async fn run(session: WebDriverSession) -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = LocatorCatalog::builtin()?;
//! let timing = TimingConfig::default();
//! let outcome = OutcomeConfig::default();
//! let engine = DiscoveryEngine::new(&session, &catalog, &timing, &outcome);
//!
//! let email = engine
//!     .finder()
//!     .find_visible_across_frames(Role::EmailInput, timing.find_per_scope())
//!     .await?;
//! engine.interactor().type_into(&email, "someone@example.com").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dropdown;
pub mod engine;
pub mod error;
pub mod finder;
pub mod interact;
pub mod outcome;
pub mod poll;
pub mod ready;
pub mod scope;

// Re-export commonly used types
pub use dropdown::{Choice, DropdownProtocol};
pub use engine::DiscoveryEngine;
pub use error::{DiscoveryError, Result};
pub use finder::{Finder, Located};
pub use interact::Interactor;
pub use outcome::{OutcomeDetector, SubmissionOutcome, SuccessSignal};
pub use poll::{poll_until, PollPolicy};
pub use ready::{locate_form_scope, wait_for_page_ready};
pub use scope::ContextNavigator;
