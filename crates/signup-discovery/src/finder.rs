//! Visibility-gated element lookup.
//!
//! Candidate strategies are evaluated in list order on every poll iteration.
//! Within one iteration the first strategy with a displayed match wins, so a
//! more specific strategy always beats a generic one that happens to match
//! too. Stale handles and other non-fatal driver errors just mean "no match
//! this time round".

use crate::error::{DiscoveryError, Result};
use crate::poll::{poll_until, PollPolicy};
use crate::scope::ContextNavigator;
use signup_core::Scope;
use signup_driver::{Driver, ElementRef, Locator};
use signup_locator::{CandidateList, Role};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// An element handle together with the scope it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Transient element reference
    pub element: ElementRef,
    /// Scope the reference is valid in
    pub scope: Scope,
}

/// Finds displayed elements by role.
pub struct Finder<'a, D: ?Sized> {
    nav: ContextNavigator<'a, D>,
    poll_interval: Duration,
}

impl<D: ?Sized> Clone for Finder<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for Finder<'_, D> {}

impl<'a, D: Driver + ?Sized> Finder<'a, D> {
    /// Create a finder polling at `poll_interval`.
    pub fn new(nav: ContextNavigator<'a, D>, poll_interval: Duration) -> Self {
        Self { nav, poll_interval }
    }

    /// The navigator this finder runs on.
    pub fn navigator(&self) -> ContextNavigator<'a, D> {
        self.nav
    }

    fn candidates(&self, role: Role) -> (Vec<Locator>, String) {
        let attempted = self
            .nav
            .catalog()
            .get(role)
            .map_or_else(|| "[]".to_string(), CandidateList::to_string);
        (self.nav.catalog().locators(role), attempted)
    }

    /// First displayed element in the current scope, one pass over `locators`.
    pub async fn first_visible(&self, locators: &[Locator]) -> Result<Option<ElementRef>> {
        let driver = self.nav.driver();
        for locator in locators {
            let found = match driver.find_all(locator).await {
                Ok(found) => found,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    trace!(locator = %locator, error = %e, "query failed");
                    continue;
                }
            };

            for element in found {
                match driver.is_displayed(&element).await {
                    Ok(true) => return Ok(Some(element)),
                    Ok(false) => {}
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => trace!(locator = %locator, error = %e, "visibility check failed"),
                }
            }
        }
        Ok(None)
    }

    /// First element in the current scope regardless of visibility.
    pub async fn first_present(&self, locators: &[Locator]) -> Result<Option<ElementRef>> {
        for locator in locators {
            match self.nav.driver().find_all(locator).await {
                Ok(found) => {
                    if let Some(element) = found.into_iter().next() {
                        return Ok(Some(element));
                    }
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => trace!(locator = %locator, error = %e, "query failed"),
            }
        }
        Ok(None)
    }

    /// Whether any of `locators` matches a displayed element in the current scope.
    pub async fn any_visible(&self, locators: &[Locator]) -> Result<bool> {
        Ok(self.first_visible(locators).await?.is_some())
    }

    /// Whether any of `locators` matches anything in the current scope.
    pub async fn exists_any(&self, locators: &[Locator]) -> Result<bool> {
        Ok(self.first_present(locators).await?.is_some())
    }

    /// Poll the current scope for a displayed element until `timeout`.
    pub async fn poll_visible(
        &self,
        locators: &[Locator],
        timeout: Duration,
    ) -> Result<Option<ElementRef>> {
        poll_until(PollPolicy::new(self.poll_interval, timeout), || {
            self.first_visible(locators)
        })
        .await
    }

    /// Poll `scope` for a displayed element of `role`.
    pub async fn find_visible(
        &self,
        role: Role,
        scope: Scope,
        timeout: Duration,
    ) -> Result<ElementRef> {
        let (locators, attempted) = self.candidates(role);
        let start = Instant::now();
        let locators = &locators;

        let found = self
            .nav
            .with_scope(scope, move || self.poll_visible(locators, timeout))
            .await?;

        found.ok_or_else(|| DiscoveryError::NotFound {
            role: role.to_string(),
            attempted,
            elapsed: start.elapsed(),
        })
    }

    /// Search the top document, then each frame, each for up to `per_scope`.
    ///
    /// The session is back at the top document when this returns; use the
    /// returned scope to act on the element.
    pub async fn find_visible_across_frames(
        &self,
        role: Role,
        per_scope: Duration,
    ) -> Result<Located> {
        let (locators, attempted) = self.candidates(role);
        let start = Instant::now();
        let locators = &locators;
        let this = *self;

        let found = self
            .nav
            .for_each_scope(move |scope| async move {
                let element = this.poll_visible(locators, per_scope).await?;
                Ok(element.map(|element| Located { element, scope }))
            })
            .await?;

        match found {
            Some(located) => {
                debug!(role = %role, scope = %located.scope, "found element");
                Ok(located)
            }
            None => Err(DiscoveryError::NotFound {
                role: role.to_string(),
                attempted,
                elapsed: start.elapsed(),
            }),
        }
    }

    /// Like [`find_visible_across_frames`](Self::find_visible_across_frames)
    /// without the visibility gate or polling; finds hidden inputs.
    pub async fn find_present_across_frames(&self, role: Role) -> Result<Located> {
        let (locators, attempted) = self.candidates(role);
        let start = Instant::now();
        let locators = &locators;
        let this = *self;

        let found = self
            .nav
            .for_each_scope(move |scope| async move {
                let element = this.first_present(locators).await?;
                Ok(element.map(|element| Located { element, scope }))
            })
            .await?;

        found.ok_or_else(|| DiscoveryError::NotFound {
            role: role.to_string(),
            attempted,
            elapsed: start.elapsed(),
        })
    }

    /// Whether an element of `role` is displayed in any scope right now.
    pub async fn visible_in_any_scope(&self, role: Role) -> Result<Option<Located>> {
        let locators = self.nav.catalog().locators(role);
        let locators = &locators;
        let this = *self;

        self.nav
            .for_each_scope(move |scope| async move {
                let element = this.first_visible(locators).await?;
                Ok(element.map(|element| Located { element, scope }))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signup_driver::mock::{Effect, MockDriver, MockNode};
    use signup_locator::LocatorCatalog;

    fn name_by_attr() -> Locator {
        Locator::name("name")
    }

    fn name_by_placeholder() -> Locator {
        Locator::xpath("//input[@placeholder='Name']")
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_order_wins() {
        let driver = MockDriver::new("http://localhost/");
        let by_placeholder =
            driver.add(MockNode::new(Scope::Top).matching(name_by_placeholder()));
        let by_attr = driver.add(MockNode::new(Scope::Top).matching(name_by_attr()));
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let element = finder
            .find_visible(Role::NameInput, Scope::Top, Duration::from_secs(1))
            .await
            .unwrap();

        // `name` is listed before the placeholder strategy
        assert_eq!(element, ElementRef::new(format!("mock-{}", by_attr.0)));
        assert_ne!(element, ElementRef::new(format!("mock-{}", by_placeholder.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_matches_are_skipped() {
        let driver = MockDriver::new("http://localhost/");
        driver.add(MockNode::new(Scope::Top).matching(name_by_attr()).hidden());
        let visible = driver.add(MockNode::new(Scope::Top).matching(name_by_placeholder()));
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let element = finder
            .find_visible(Role::NameInput, Scope::Top, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(element, ElementRef::new(format!("mock-{}", visible.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_match_falls_through_to_next_strategy() {
        let driver = MockDriver::new("http://localhost/");
        let rerendered =
            driver.add(MockNode::new(Scope::Top).matching(name_by_attr()).stale_on_check());
        let fallback = driver.add(MockNode::new(Scope::Top).matching(name_by_placeholder()));
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let element = finder
            .find_visible(Role::NameInput, Scope::Top, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(element, ElementRef::new(format!("mock-{}", fallback.0)));
        let stale = ElementRef::new(format!("mock-{}", rerendered.0));
        assert!(driver.is_displayed(&stale).await.unwrap_err().is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_match_is_requeried_on_next_poll() {
        let driver = MockDriver::new("http://localhost/");
        driver.add(MockNode::new(Scope::Top).matching(name_by_attr()).stale_on_check());
        let replacement = driver.add(MockNode::new(Scope::Top).matching(name_by_attr()).hidden());
        driver.apply(Effect::ShowAfter(replacement, Duration::from_millis(200)));
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let start = Instant::now();
        let element = finder
            .find_visible(Role::NameInput, Scope::Top, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(element, ElementRef::new(format!("mock-{}", replacement.0)));
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_late_render() {
        let driver = MockDriver::new("http://localhost/");
        let input = driver.add(MockNode::new(Scope::Top).matching(name_by_attr()).hidden());
        driver.apply(Effect::ShowAfter(input, Duration::from_millis(500)));
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let start = Instant::now();
        let element = finder
            .find_visible(Role::NameInput, Scope::Top, Duration::from_secs(3))
            .await;
        assert!(element.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_names_role() {
        let driver = MockDriver::new("http://localhost/");
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let err = finder
            .find_visible(Role::EmailInput, Scope::Top, Duration::from_millis(300))
            .await
            .unwrap_err();

        match err {
            DiscoveryError::NotFound {
                role,
                attempted,
                elapsed,
            } => {
                assert_eq!(role, "email_input");
                assert!(attempted.contains("@type='email'"));
                assert!(elapsed >= Duration::from_millis(300));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_across_frames_reports_scope_and_resets() {
        let driver = MockDriver::new("http://localhost/");
        driver.add_frame();
        driver.add_frame();
        let inner = driver.add(MockNode::new(Scope::Frame(1)).matching(name_by_attr()));
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        let located = finder
            .find_visible_across_frames(Role::NameInput, Duration::from_millis(200))
            .await
            .unwrap();

        assert_eq!(located.scope, Scope::Frame(1));
        assert_eq!(located.element, ElementRef::new(format!("mock-{}", inner.0)));
        assert_eq!(driver.active_scope(), Scope::Top);
    }

    #[tokio::test(start_paused = true)]
    async fn test_present_ignores_visibility() {
        let driver = MockDriver::new("http://localhost/");
        driver.add_frame();
        driver.add(
            MockNode::new(Scope::Frame(0))
                .matching(Locator::css("input[type='checkbox']"))
                .checkbox(false)
                .hidden(),
        );
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        assert!(finder
            .find_visible_across_frames(Role::TermsCheckbox, Duration::from_millis(100))
            .await
            .is_err());
        let located = finder
            .find_present_across_frames(Role::TermsCheckbox)
            .await
            .unwrap();
        assert_eq!(located.scope, Scope::Frame(0));
    }
}
