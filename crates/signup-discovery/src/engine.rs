//! One-stop construction of the discovery components from configuration.

use crate::dropdown::DropdownProtocol;
use crate::error::Result;
use crate::finder::Finder;
use crate::interact::Interactor;
use crate::outcome::OutcomeDetector;
use crate::poll::PollPolicy;
use crate::ready;
use crate::scope::ContextNavigator;
use signup_core::{OutcomeConfig, Scope, TimingConfig};
use signup_driver::Driver;
use signup_locator::LocatorCatalog;

/// Discovery components wired to one driver session and catalog.
pub struct DiscoveryEngine<'a, D: ?Sized> {
    nav: ContextNavigator<'a, D>,
    timing: &'a TimingConfig,
    outcome: &'a OutcomeConfig,
}

impl<'a, D: Driver + ?Sized> DiscoveryEngine<'a, D> {
    /// Wire the components.
    pub fn new(
        driver: &'a D,
        catalog: &'a LocatorCatalog,
        timing: &'a TimingConfig,
        outcome: &'a OutcomeConfig,
    ) -> Self {
        Self {
            nav: ContextNavigator::new(driver, catalog),
            timing,
            outcome,
        }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &'a D {
        self.nav.driver()
    }

    /// Timing the components were built with.
    pub fn timing(&self) -> &'a TimingConfig {
        self.timing
    }

    /// Scope navigator.
    pub fn navigator(&self) -> ContextNavigator<'a, D> {
        self.nav
    }

    /// Element finder.
    pub fn finder(&self) -> Finder<'a, D> {
        Finder::new(self.nav, self.timing.poll_interval())
    }

    /// Robust interactor.
    pub fn interactor(&self) -> Interactor<'a, D> {
        Interactor::new(
            self.nav,
            PollPolicy::new(self.timing.poll_interval(), self.timing.clickable_timeout()),
        )
    }

    /// Dropdown protocol.
    pub fn dropdown(&self) -> DropdownProtocol<'a, D> {
        DropdownProtocol::new(
            self.finder(),
            self.interactor(),
            self.timing.render_settle(),
            PollPolicy::new(self.timing.option_poll(), self.timing.option_read_window()),
        )
    }

    /// Submission outcome detector.
    pub fn outcome_detector(&self) -> OutcomeDetector<'a, D> {
        OutcomeDetector::new(
            self.finder(),
            PollPolicy::new(self.timing.outcome_poll(), self.timing.submit_budget()),
            self.outcome,
        )
    }

    /// Wait for document readiness within the configured bound.
    pub async fn wait_for_page_ready(&self) -> Result<bool> {
        ready::wait_for_page_ready(
            self.driver(),
            PollPolicy::new(self.timing.poll_interval(), self.timing.page_ready_timeout()),
        )
        .await
    }

    /// Scope hosting the sign-up form, if any.
    pub async fn locate_form_scope(&self) -> Result<Option<Scope>> {
        ready::locate_form_scope(self.finder()).await
    }
}
