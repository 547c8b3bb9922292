//! Page readiness and form location.

use crate::error::{DiscoveryError, Result};
use crate::finder::Finder;
use crate::poll::{poll_until, PollPolicy};
use serde_json::Value;
use signup_core::Scope;
use signup_driver::Driver;
use signup_locator::Role;
use tracing::{debug, info, trace, warn};

/// Script returning `document.readyState`.
pub const READY_STATE_SCRIPT: &str = "return document.readyState;";

/// Script returning whether AngularJS has no pending HTTP requests.
///
/// Pages without AngularJS, and any script failure, count as idle.
pub const ANGULAR_IDLE_SCRIPT: &str = "try { if (window.angular && angular.element(document.body).injector) { \
var $http = angular.element(document.body).injector().get('$http'); \
return ($http.pendingRequests.length === 0); } else { return true; } } catch(e) { return true; }";

/// Wait until the document is loaded and client-side requests have settled.
///
/// Returns `false` if the budget ran out first. Script errors other than
/// fatal session failures are treated as settled.
pub async fn wait_for_page_ready<D: Driver + ?Sized>(driver: &D, policy: PollPolicy) -> Result<bool> {
    let ready = poll_until(policy, || async {
        let loaded = match driver.execute_script(READY_STATE_SCRIPT, Vec::new()).await {
            Ok(Value::String(state)) => state == "complete",
            Ok(_) => true,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                trace!(error = %e, "readyState check failed");
                true
            }
        };
        if !loaded {
            return Ok(None);
        }

        let idle = match driver.execute_script(ANGULAR_IDLE_SCRIPT, Vec::new()).await {
            Ok(Value::Bool(idle)) => idle,
            Ok(_) => true,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                trace!(error = %e, "angular check failed");
                true
            }
        };
        Ok::<_, DiscoveryError>(idle.then_some(()))
    })
    .await?;

    if ready.is_none() {
        warn!(budget = ?policy.budget, "page did not settle");
    }
    Ok(ready.is_some())
}

/// Find the scope that hosts the sign-up form.
///
/// A scope hosts the form when a name input or a language toggle is present
/// in it. Presence is enough; the form may still be rendering.
pub async fn locate_form_scope<D: Driver + ?Sized>(finder: Finder<'_, D>) -> Result<Option<Scope>> {
    let catalog = finder.navigator().catalog();
    let mut markers = catalog.locators(Role::NameInput);
    markers.extend(catalog.locators(Role::LanguageToggle));
    let markers = &markers;

    let scope = finder
        .navigator()
        .for_each_scope(move |scope| async move {
            Ok(finder.exists_any(markers).await?.then_some(scope))
        })
        .await?;

    match scope {
        Some(scope) => info!(scope = %scope, "form located"),
        None => debug!("form markers not present in any scope"),
    }
    Ok(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ContextNavigator;
    use signup_driver::mock::{MockDriver, MockNode};
    use signup_driver::Locator;
    use signup_locator::LocatorCatalog;
    use std::time::Duration;

    fn policy() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(100), Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_when_complete_and_idle() {
        let driver = MockDriver::new("http://localhost/");
        assert!(wait_for_page_ready(&driver, policy()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_requests_exhaust_budget() {
        let driver = MockDriver::new("http://localhost/");
        driver.set_angular_idle(false);

        let start = tokio::time::Instant::now();
        assert!(!wait_for_page_ready(&driver, policy()).await.unwrap());
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_document_is_not_ready() {
        let driver = MockDriver::new("http://localhost/");
        driver.set_ready_state("loading");
        assert!(!wait_for_page_ready(&driver, policy()).await.unwrap());
    }

    #[tokio::test]
    async fn test_form_in_frame() {
        let driver = MockDriver::new("http://localhost/");
        driver.add_frame();
        driver.add(
            MockNode::new(Scope::Frame(0))
                .matching(Locator::name("name"))
                .hidden(),
        );
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        assert_eq!(locate_form_scope(finder).await.unwrap(), Some(Scope::Frame(0)));
        assert_eq!(driver.active_scope(), Scope::Top);
    }

    #[tokio::test]
    async fn test_no_form() {
        let driver = MockDriver::new("http://localhost/");
        let catalog = LocatorCatalog::builtin().unwrap();
        let finder = Finder::new(ContextNavigator::new(&driver, &catalog), Duration::from_millis(80));

        assert_eq!(locate_form_scope(finder).await.unwrap(), None);
    }
}
