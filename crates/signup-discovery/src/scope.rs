//! Scoped execution against the top document and its frames.
//!
//! The browser session has a single active scope. Every operation here
//! enters the scope it needs and always leaves the session at the top
//! document, whether it succeeds or fails.

use crate::error::Result;
use signup_core::Scope;
use signup_driver::{Driver, DriverError};
use signup_locator::{LocatorCatalog, Role};
use std::future::Future;
use tracing::{debug, trace, warn};

/// Switches the session between the top document and its frames.
pub struct ContextNavigator<'a, D: ?Sized> {
    driver: &'a D,
    catalog: &'a LocatorCatalog,
}

impl<D: ?Sized> Clone for ContextNavigator<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for ContextNavigator<'_, D> {}

impl<'a, D: Driver + ?Sized> ContextNavigator<'a, D> {
    /// Create a navigator over a driver session.
    pub fn new(driver: &'a D, catalog: &'a LocatorCatalog) -> Self {
        Self { driver, catalog }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &'a D {
        self.driver
    }

    /// The catalog frames are enumerated with.
    pub fn catalog(&self) -> &'a LocatorCatalog {
        self.catalog
    }

    /// Make `scope` the active scope, starting from the top document.
    pub async fn enter(&self, scope: Scope) -> std::result::Result<(), DriverError> {
        self.driver.switch_to_top().await?;
        if let Scope::Frame(index) = scope {
            self.driver.switch_to_frame(index).await?;
        }
        trace!(scope = %scope, "entered scope");
        Ok(())
    }

    /// Return to the top document. Failures are logged, not raised.
    pub async fn reset(&self) {
        if let Err(e) = self.driver.switch_to_top().await {
            warn!(error = %e, "failed to return to top document");
        }
    }

    /// Run `f` with `scope` active, then return to the top document.
    ///
    /// A failed switch (for example into a frame that has since vanished)
    /// is returned as a driver error after resetting.
    pub async fn with_scope<T, F, Fut>(&self, scope: Scope, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Err(e) = self.enter(scope).await {
            self.reset().await;
            return Err(e.into());
        }

        let result = f().await;
        self.reset().await;
        result
    }

    /// Frames of the top document, in document order.
    pub async fn enumerate_frames(&self) -> Result<Vec<Scope>> {
        self.enter(Scope::Top).await?;

        let mut count = 0;
        for locator in self.catalog.locators(Role::Frame) {
            match self.driver.find_all(&locator).await {
                Ok(found) if !found.is_empty() => {
                    count = found.len();
                    break;
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => trace!(locator = %locator, error = %e, "frame query failed"),
            }
        }

        Ok(Scope::all(count).skip(1).collect())
    }

    /// Visit the top document, then each frame, until `visit` yields a value.
    ///
    /// Each visit runs with its scope active. Frames that cannot be entered
    /// are skipped. The session is at the top document when this returns.
    pub async fn for_each_scope<T, F, Fut>(&self, mut visit: F) -> Result<Option<T>>
    where
        F: FnMut(Scope) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut scopes = vec![Scope::Top];
        match self.enumerate_frames().await {
            Ok(frames) => scopes.extend(frames),
            Err(e) => {
                self.reset().await;
                return Err(e);
            }
        }

        for scope in scopes {
            if let Err(e) = self.enter(scope).await {
                if e.is_fatal() {
                    self.reset().await;
                    return Err(e.into());
                }
                debug!(scope = %scope, error = %e, "skipping scope");
                continue;
            }

            match visit(scope).await {
                Ok(Some(value)) => {
                    self.reset().await;
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(e) => {
                    self.reset().await;
                    return Err(e);
                }
            }
        }

        self.reset().await;
        Ok(None)
    }
}
