//! Browser driver abstraction for the sign-up form checker.
//!
//! [`Driver`] is the narrow set of browser capabilities the discovery engine
//! needs. [`WebDriverSession`] speaks W3C WebDriver over HTTP to a running
//! driver server; [`mock::MockDriver`] (feature `mock`) is an in-memory
//! scripted DOM for tests.

pub mod capabilities;
pub mod driver;
pub mod error;
pub mod locator;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod webdriver;

pub use capabilities::SessionCapabilities;
pub use driver::{extract_domain, keys, Driver, ElementRef, Rect};
pub use error::{DriverError, Result};
pub use locator::{Locator, Using};
pub use webdriver::WebDriverSession;
