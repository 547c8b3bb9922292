//! Interaction primitives with scripted fallbacks.
//!
//! Native WebDriver interactions come first. When the page blocks them
//! (overlays, custom-styled inputs, elements the driver considers not
//! interactable) the same effect is produced through a script. A failure is
//! only surfaced once every fallback has been tried.

use crate::error::{DiscoveryError, Result};
use crate::finder::Located;
use crate::poll::{poll_until, PollPolicy};
use crate::scope::ContextNavigator;
use serde_json::Value;
use signup_driver::{keys, Driver, DriverError, ElementRef};
use tracing::{debug, trace};

const SCROLL_CENTER_SCRIPT: &str =
    "arguments[0].scrollIntoView({block:'center', inline:'nearest'});";
const CLICK_SCRIPT: &str = "arguments[0].click();";
const SET_CHECKED_SCRIPT: &str = "arguments[0].checked = arguments[1]; \
     arguments[0].dispatchEvent(new Event('change', {bubbles:true}));";

/// Clicks, types and toggles located elements.
pub struct Interactor<'a, D: ?Sized> {
    nav: ContextNavigator<'a, D>,
    clickable: PollPolicy,
}

impl<D: ?Sized> Clone for Interactor<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for Interactor<'_, D> {}

impl<'a, D: Driver + ?Sized> Interactor<'a, D> {
    /// Create an interactor; `clickable` bounds the wait for visible + enabled.
    pub fn new(nav: ContextNavigator<'a, D>, clickable: PollPolicy) -> Self {
        Self { nav, clickable }
    }

    fn driver(&self) -> &'a D {
        self.nav.driver()
    }

    /// Scroll the element to the viewport center. Script errors are ignored.
    pub async fn scroll_into_view(&self, element: &ElementRef) {
        if let Err(e) = self
            .driver()
            .execute_script(SCROLL_CENTER_SCRIPT, vec![element.to_arg()])
            .await
        {
            trace!(error = %e, "scrollIntoView failed");
        }
    }

    /// Send Escape to the element. Errors are ignored.
    pub async fn press_escape(&self, element: &ElementRef) {
        if let Err(e) = self.driver().send_keys(element, keys::ESCAPE).await {
            trace!(error = %e, "escape failed");
        }
    }

    /// Wait until the element is displayed and enabled.
    ///
    /// Returns `false` when the bound elapses or the handle goes stale.
    async fn wait_clickable(&self, element: &ElementRef) -> Result<bool> {
        let driver = self.driver();
        let state = poll_until(self.clickable, move || async move {
            let ready = async {
                Ok::<_, DriverError>(
                    driver.is_displayed(element).await? && driver.is_enabled(element).await?,
                )
            };
            match ready.await {
                Ok(true) => Ok(Some(true)),
                Ok(false) => Ok(None),
                Err(e) if e.is_fatal() => Err(DiscoveryError::from(e)),
                Err(e) if e.is_stale() => Ok(Some(false)),
                Err(_) => Ok(None),
            }
        })
        .await?;
        Ok(state == Some(true))
    }

    async fn script_click(&self, element: &ElementRef, action: &str) -> Result<()> {
        match self
            .driver()
            .execute_script(CLICK_SCRIPT, vec![element.to_arg()])
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => Err(DiscoveryError::Obstructed {
                action: action.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Click an element in the current scope.
    pub async fn click_element(&self, element: &ElementRef) -> Result<()> {
        let clickable = self.wait_clickable(element).await?;
        self.scroll_into_view(element).await;

        if clickable {
            match self.driver().click(element).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => debug!(error = %e, "native click blocked, using scripted click"),
            }
        } else {
            debug!("element never became clickable, using scripted click");
        }

        self.script_click(element, "click").await
    }

    /// Click a located element inside its scope.
    pub async fn click(&self, located: &Located) -> Result<()> {
        let element = &located.element;
        self.nav
            .with_scope(located.scope, move || self.click_element(element))
            .await
    }

    /// Replace the element's content with `text`.
    pub async fn type_into(&self, located: &Located, text: &str) -> Result<()> {
        let driver = self.driver();
        let element = &located.element;

        self.nav
            .with_scope(located.scope, move || async move {
                match driver.clear(element).await {
                    Ok(()) => {}
                    Err(DriverError::InvalidElementState(reason)) => {
                        debug!(%reason, "clear rejected, selecting and deleting");
                        driver.send_keys(element, &keys::select_all()).await?;
                        driver.send_keys(element, keys::DELETE).await?;
                    }
                    Err(e) => return Err(e.into()),
                }
                driver.send_keys(element, text).await?;
                Ok(())
            })
            .await
    }

    /// Put a checkbox into the `desired` state and verify it.
    ///
    /// No click happens when it is already there.
    pub async fn set_checkbox(&self, located: &Located, desired: bool) -> Result<()> {
        let element = &located.element;
        self.nav
            .with_scope(located.scope, move || self.set_checkbox_here(element, desired))
            .await
    }

    async fn set_checkbox_here(&self, element: &ElementRef, desired: bool) -> Result<()> {
        let driver = self.driver();
        if driver.is_selected(element).await? == desired {
            debug!(desired, "checkbox already in desired state");
            return Ok(());
        }

        let native = if self.wait_clickable(element).await? {
            self.scroll_into_view(element).await;
            driver.click(element).await
        } else {
            Err(DriverError::NotInteractable("checkbox is not clickable".to_string()))
        };

        match native {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                debug!(error = %e, "native checkbox click blocked, setting state by script");
                self.script_set_checked(element, desired).await?;
            }
        }

        self.verify_checkbox(element, desired).await
    }

    async fn script_set_checked(&self, element: &ElementRef, desired: bool) -> Result<()> {
        let args = vec![element.to_arg(), Value::Bool(desired)];
        match self.driver().execute_script(SET_CHECKED_SCRIPT, args).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                debug!(error = %e, "scripted state change failed");
                Ok(())
            }
        }
    }

    /// Re-read the state, force it with a scripted click if wrong, and check once more.
    async fn verify_checkbox(&self, element: &ElementRef, desired: bool) -> Result<()> {
        let driver = self.driver();
        if driver.is_selected(element).await? != desired {
            debug!("checkbox state still wrong, forcing scripted click");
            if let Err(e) = driver.execute_script(CLICK_SCRIPT, vec![element.to_arg()]).await {
                if e.is_fatal() {
                    return Err(e.into());
                }
                debug!(error = %e, "scripted click failed");
            }
        }

        if driver.is_selected(element).await? == desired {
            return Ok(());
        }
        let state = if desired { "unchecked" } else { "checked" };
        Err(DiscoveryError::Obstructed {
            action: "set checkbox".to_string(),
            reason: format!("checkbox is still {state} after native and scripted attempts"),
        })
    }

    /// Put a checkbox into the `desired` state by script only.
    ///
    /// For inputs the page keeps hidden behind a styled label, where a
    /// native click can never land.
    pub async fn force_checkbox(&self, located: &Located, desired: bool) -> Result<()> {
        let element = &located.element;
        self.nav
            .with_scope(located.scope, move || async move {
                if self.driver().is_selected(element).await? == desired {
                    return Ok(());
                }
                self.script_set_checked(element, desired).await?;
                self.verify_checkbox(element, desired).await
            })
            .await
    }

    /// Pointer click `inset` pixels inside the element's left edge, vertically centered.
    ///
    /// Keeps clicks on a label away from a hyperlink embedded in its text.
    pub async fn click_near_left_edge(&self, located: &Located, inset: i64) -> Result<()> {
        let element = &located.element;
        let rect = self
            .nav
            .with_scope(located.scope, move || async move {
                Ok(self.driver().rect(element).await?)
            })
            .await?;

        #[allow(clippy::cast_possible_truncation)]
        let dx = -(rect.width as i64) / 2 + inset;
        debug!(dx, width = rect.width, "clicking near left edge");
        self.click_at_offset(located, dx, 0).await
    }

    /// Pointer click at an offset from the element's center.
    pub async fn click_at_offset(&self, located: &Located, dx: i64, dy: i64) -> Result<()> {
        let driver = self.driver();
        let element = &located.element;

        self.nav
            .with_scope(located.scope, move || async move {
                self.scroll_into_view(element).await;
                match driver.click_at_offset(element, dx, dy).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_fatal() => Err(e.into()),
                    Err(e) => Err(DiscoveryError::Obstructed {
                        action: "click at offset".to_string(),
                        reason: e.to_string(),
                    }),
                }
            })
            .await
    }
}
