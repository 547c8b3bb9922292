//! Submission outcome detection.
//!
//! After the form is submitted the detector polls for a classification.
//! Each poll checks, in order: a visible success banner, a visible
//! validation message, success phrases in the page text, and a URL change.
//! The first check that fires decides the outcome.

use crate::error::Result;
use crate::finder::Finder;
use crate::poll::{poll_until, PollPolicy};
use serde_json::Value;
use signup_core::OutcomeConfig;
use signup_driver::{Driver, DriverError};
use signup_locator::Role;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Script returning the rendered text of the current document body.
pub const BODY_TEXT_SCRIPT: &str =
    "return (document.body && (document.body.innerText || document.body.textContent)) || '';";

/// What showed that a submission succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessSignal {
    /// A success banner or toast became visible
    Banner,
    /// The page text contains every success phrase
    PageText,
    /// The browser left the form URL
    UrlChanged,
}

/// Classification of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The form was accepted
    Success(SuccessSignal),
    /// The form was rejected with this message
    ValidationError(String),
    /// No signal within the budget
    Timeout,
}

impl SubmissionOutcome {
    /// Whether the submission was accepted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(signal) => write!(f, "success ({signal:?})"),
            Self::ValidationError(message) => write!(f, "validation error: {message}"),
            Self::Timeout => write!(f, "no outcome signal"),
        }
    }
}

/// Classifies what happened after a submit.
pub struct OutcomeDetector<'a, D: ?Sized> {
    finder: Finder<'a, D>,
    policy: PollPolicy,
    success_phrases: Vec<String>,
    validation_keywords: Vec<String>,
}

impl<'a, D: Driver + ?Sized> OutcomeDetector<'a, D> {
    /// Create a detector polling with `policy`.
    pub fn new(finder: Finder<'a, D>, policy: PollPolicy, config: &OutcomeConfig) -> Self {
        Self {
            finder,
            policy,
            success_phrases: config.success_phrases.iter().map(|p| p.to_lowercase()).collect(),
            validation_keywords: config
                .validation_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    fn driver(&self) -> &'a D {
        self.finder.navigator().driver()
    }

    /// Poll until a signal appears or the budget runs out.
    ///
    /// `start_url` is the URL captured before the submit click.
    pub async fn wait_for_outcome(&self, start_url: &str) -> Result<SubmissionOutcome> {
        let outcome = poll_until(self.policy, || self.classify_once(start_url)).await?;

        let outcome = outcome.unwrap_or(SubmissionOutcome::Timeout);
        info!(outcome = %outcome, "submission classified");
        Ok(outcome)
    }

    /// One pass of the checks, in priority order.
    ///
    /// Only structural banners count as [`SuccessSignal::Banner`]; phrase
    /// matches wait until the error banners have been checked.
    pub async fn classify_once(&self, start_url: &str) -> Result<Option<SubmissionOutcome>> {
        if self.finder.visible_in_any_scope(Role::SuccessBanner).await?.is_some() {
            return Ok(Some(SubmissionOutcome::Success(SuccessSignal::Banner)));
        }

        if let Some(message) = self.validation_message().await? {
            debug!(%message, "validation message visible");
            return Ok(Some(SubmissionOutcome::ValidationError(message)));
        }

        if self.page_text_signals_success().await? {
            return Ok(Some(SubmissionOutcome::Success(SuccessSignal::PageText)));
        }

        match self.driver().current_url().await {
            Ok(url) if url != start_url => {
                debug!(from = start_url, to = %url, "url changed");
                return Ok(Some(SubmissionOutcome::Success(SuccessSignal::UrlChanged)));
            }
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => trace!(error = %e, "url check failed"),
        }

        Ok(None)
    }

    fn is_validation_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.validation_keywords.iter().any(|k| lower.contains(k))
    }

    fn has_success_phrases(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        !self.success_phrases.is_empty() && self.success_phrases.iter().all(|p| lower.contains(p))
    }

    /// Text of the first visible error banner that reads like a validation message.
    pub async fn validation_message(&self) -> Result<Option<String>> {
        let locators = self.finder.navigator().catalog().locators(Role::ErrorBanner);
        let locators = &locators;
        let driver = self.driver();

        self.finder
            .navigator()
            .for_each_scope(move |_| async move {
                for locator in locators {
                    let Ok(items) = driver.find_all(locator).await else {
                        continue;
                    };
                    for item in items {
                        let text = async {
                            if driver.is_displayed(&item).await? {
                                driver.text(&item).await.map(Some)
                            } else {
                                Ok::<_, DriverError>(None)
                            }
                        };
                        match text.await {
                            Ok(Some(text)) => {
                                let text = text.trim();
                                if !text.is_empty() && self.is_validation_text(text) {
                                    return Ok(Some(text.to_string()));
                                }
                            }
                            Ok(None) => {}
                            Err(e) if e.is_fatal() => return Err(e.into()),
                            Err(e) => trace!(error = %e, "error banner read failed"),
                        }
                    }
                }
                Ok(None)
            })
            .await
    }

    /// Whether the body text of any scope contains every success phrase.
    pub async fn page_text_signals_success(&self) -> Result<bool> {
        let driver = self.driver();
        let found = self
            .finder
            .navigator()
            .for_each_scope(move |_| async move {
                match driver.execute_script(BODY_TEXT_SCRIPT, Vec::new()).await {
                    Ok(Value::String(text)) => Ok(self.has_success_phrases(&text).then_some(())),
                    Ok(_) => Ok(None),
                    Err(e) if e.is_fatal() => Err(e.into()),
                    Err(e) => {
                        trace!(error = %e, "body text read failed");
                        Ok(None)
                    }
                }
            })
            .await?;
        Ok(found.is_some())
    }

    /// Whether a confirmation is on screen now.
    ///
    /// Looks for a success banner in each scope (up to `per_scope` each),
    /// then for the success phrases in the page text.
    pub async fn confirmation_shown(&self, per_scope: Duration) -> Result<bool> {
        match self
            .finder
            .find_visible_across_frames(Role::SuccessBanner, per_scope)
            .await
        {
            Ok(located) => {
                debug!(scope = %located.scope, "confirmation banner visible");
                return Ok(true);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.page_text_signals_success().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ContextNavigator;
    use signup_core::Scope;
    use signup_driver::mock::{MockDriver, MockNode};
    use signup_driver::Locator;
    use signup_locator::LocatorCatalog;

    const START: &str = "http://localhost/#/SignUp";

    fn detector<'a>(driver: &'a MockDriver, catalog: &'a LocatorCatalog) -> OutcomeDetector<'a, MockDriver> {
        OutcomeDetector::new(
            Finder::new(ContextNavigator::new(driver, catalog), Duration::from_millis(80)),
            PollPolicy::new(Duration::from_millis(120), Duration::from_secs(8)),
            &OutcomeConfig::default(),
        )
    }

    fn error_banner() -> Locator {
        Locator::css(".help-block, .text-danger, .alert-danger, .validation-message, [data-valmsg-for]")
    }

    fn success_banner() -> Locator {
        Locator::css(".alert-success, .toast-success, .toast-message, .text-success, .alert.alert-success")
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_success() {
        let driver = MockDriver::new(START);
        driver.add(MockNode::new(Scope::Top).matching(success_banner()).text("Done"));
        let catalog = LocatorCatalog::builtin().unwrap();

        let outcome = detector(&driver, &catalog).wait_for_outcome(START).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Success(SuccessSignal::Banner));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_beats_page_text() {
        let driver = MockDriver::new(START);
        driver.add(
            MockNode::new(Scope::Top)
                .matching(error_banner())
                .text("  Email is required  "),
        );
        driver.set_body_text(Scope::Top, "A welcome email has been sent. Please check your email.");
        let catalog = LocatorCatalog::builtin().unwrap();

        let outcome = detector(&driver, &catalog).wait_for_outcome(START).await.unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::ValidationError("Email is required".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_without_keyword_is_ignored() {
        let driver = MockDriver::new(START);
        driver.add(MockNode::new(Scope::Top).matching(error_banner()).text("Tip: use a work address"));
        driver.set_body_text(Scope::Top, "Welcome email sent, check your email");
        let catalog = LocatorCatalog::builtin().unwrap();

        let outcome = detector(&driver, &catalog).wait_for_outcome(START).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Success(SuccessSignal::PageText));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_text_in_frame() {
        let driver = MockDriver::new(START);
        driver.add_frame();
        driver.set_body_text(Scope::Frame(0), "WELCOME EMAIL on its way. CHECK YOUR EMAIL.");
        let catalog = LocatorCatalog::builtin().unwrap();

        let outcome = detector(&driver, &catalog).wait_for_outcome(START).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Success(SuccessSignal::PageText));
        assert_eq!(driver.active_scope(), Scope::Top);
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_change() {
        let driver = MockDriver::new("http://localhost/#/Welcome");
        let catalog = LocatorCatalog::builtin().unwrap();

        let outcome = detector(&driver, &catalog).wait_for_outcome(START).await.unwrap();
        assert_eq!(outcome, SubmissionOutcome::Success(SuccessSignal::UrlChanged));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_budget() {
        let driver = MockDriver::new(START);
        driver.set_body_text(Scope::Top, "A welcome email is nice");
        let catalog = LocatorCatalog::builtin().unwrap();

        let start = tokio::time::Instant::now();
        let outcome = detector(&driver, &catalog).wait_for_outcome(START).await.unwrap();

        assert_eq!(outcome, SubmissionOutcome::Timeout);
        assert!(start.elapsed() >= Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_shown_false_without_error() {
        let driver = MockDriver::new(START);
        let catalog = LocatorCatalog::builtin().unwrap();

        let shown = detector(&driver, &catalog)
            .confirmation_shown(Duration::from_millis(300))
            .await
            .unwrap();
        assert!(!shown);
    }
}
