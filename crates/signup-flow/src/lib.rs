//! Signup Flow - The sign-up form check built on the discovery engine.
//!
//! [`SignUpPage`] exposes one method per user-visible action and decides the
//! order of discovery tiers for each; [`run_signup`] strings the actions
//! together the way the `signup-check` binary runs them.
//!
//! # Example
//!
//! ```rust,no_run
//! use signup_core::AppConfig;
//! use signup_driver::{SessionCapabilities, WebDriverSession};
//! use signup_flow::{run_signup, SignUpPage};
//! use signup_locator::LocatorCatalog;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let catalog = LocatorCatalog::load(&config.catalog)?;
//! let session = WebDriverSession::connect(
//!     &config.browser.webdriver_url,
//!     &SessionCapabilities::chrome(&config.browser),
//! )
//! .await?;
//!
//! let mut page = SignUpPage::new(&session, &catalog, &config);
//! let report = run_signup(&mut page, &config.profile, &config.languages.preferred, 1).await?;
//! assert!(report.passed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod language;
pub mod page;
pub mod report;
pub mod workflow;

// Re-export commonly used types
pub use error::{FlowError, Result, Step};
pub use language::{covers_required, LanguageChoice};
pub use page::{input_role, SignUpPage, TermsPath};
pub use report::{save_failure_screenshot, screenshot_file_name};
pub use workflow::{run_signup, RunReport};
