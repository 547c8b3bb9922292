//! Page object for the sign-up form.
//!
//! Sequences the discovery engine for each user-visible action. No element
//! lookup logic lives here; only the order of the tiers each action tries.

use crate::error::{at, Result, Step};
use crate::language::{covers_required, LanguageChoice};
use signup_core::{AppConfig, FieldRole, Scope};
use signup_discovery::{DiscoveryEngine, DiscoveryError, SubmissionOutcome};
use signup_driver::{extract_domain, Driver};
use signup_locator::{LocatorCatalog, Role};
use tracing::{debug, info, warn};

/// Pixels inside the terms label's left edge where it is clicked.
pub const LABEL_CLICK_INSET: i64 = 6;

const SCROLL_TOP_SCRIPT: &str = "window.scrollTo(0,0);";

/// Role of the input behind a text field.
#[must_use]
pub fn input_role(field: FieldRole) -> Role {
    match field {
        FieldRole::Name => Role::NameInput,
        FieldRole::Organization => Role::OrganizationInput,
        FieldRole::Email => Role::EmailInput,
    }
}

/// Which control ended up accepting the terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermsPath {
    /// The checkbox itself was visible and set
    Checkbox(Scope),
    /// The label was clicked; the checkbox (if any) was verified afterwards
    Label(Scope),
}

/// The sign-up page driven through one browser session.
pub struct SignUpPage<'a, D: ?Sized> {
    engine: DiscoveryEngine<'a, D>,
    config: &'a AppConfig,
    last_validation_error: Option<String>,
}

impl<'a, D: Driver + ?Sized> SignUpPage<'a, D> {
    /// Create the page object.
    pub fn new(driver: &'a D, catalog: &'a LocatorCatalog, config: &'a AppConfig) -> Self {
        Self {
            engine: DiscoveryEngine::new(driver, catalog, &config.timing, &config.outcome),
            config,
            last_validation_error: None,
        }
    }

    /// The discovery engine behind this page.
    pub fn engine(&self) -> &DiscoveryEngine<'a, D> {
        &self.engine
    }

    /// Navigate to the configured URL and wait for it to settle.
    ///
    /// Returns the scope the form markers were found in, if any.
    pub async fn open_page(&self) -> Result<Option<Scope>> {
        let url = &self.config.target.url;
        let host = extract_domain(url).map_err(|e| at(Step::OpenPage)(e.into()))?;
        info!(%url, %host, "opening sign-up page");

        self.engine
            .driver()
            .navigate(url)
            .await
            .map_err(|e| at(Step::OpenPage)(e.into()))?;
        self.engine
            .wait_for_page_ready()
            .await
            .map_err(at(Step::OpenPage))?;
        self.engine
            .locate_form_scope()
            .await
            .map_err(at(Step::OpenPage))
    }

    /// Whether every required language is offered.
    ///
    /// Tiers in order: native `<select>` options, custom dropdown options,
    /// then labels visible as plain page text.
    pub async fn languages_available(&self) -> Result<bool> {
        let required = &self.config.languages.required;
        let dropdown = self.engine.dropdown();

        let native = dropdown
            .read_native_in_any_scope()
            .await
            .map_err(at(Step::ValidateLanguages))?;
        if covers_required(required, &native) {
            info!(tier = "native select", options = ?native, "languages available");
            return Ok(true);
        }

        let custom = dropdown
            .read_options_in_any_scope()
            .await
            .map_err(at(Step::ValidateLanguages))?;
        if covers_required(required, &custom) {
            info!(tier = "custom dropdown", options = ?custom, "languages available");
            return Ok(true);
        }

        for group in required {
            let mut seen = false;
            for label in group {
                if dropdown
                    .text_visible_in_any_scope(label)
                    .await
                    .map_err(at(Step::ValidateLanguages))?
                {
                    seen = true;
                    break;
                }
            }
            if !seen {
                let frames = self
                    .engine
                    .navigator()
                    .enumerate_frames()
                    .await
                    .map_or(0, |frames| frames.len());
                warn!(missing = ?group, frames, "no language control offers the required languages");
                return Ok(false);
            }
        }

        info!(tier = "page text", "languages available");
        Ok(true)
    }

    /// Select `language`, native `<select>` first, then custom dropdowns.
    ///
    /// A language that is not offered is not an error; the page default
    /// stays in effect.
    pub async fn select_language(&self, language: &str) -> Result<LanguageChoice> {
        let dropdown = self.engine.dropdown();

        if let Some(scope) = dropdown
            .select_native_in_any_scope(language)
            .await
            .map_err(at(Step::SelectLanguage))?
        {
            info!(language, scope = %scope, "language selected in native select");
            return Ok(LanguageChoice::Native(scope));
        }

        if let Some(scope) = dropdown
            .choose_in_any_scope(language)
            .await
            .map_err(at(Step::SelectLanguage))?
        {
            info!(language, scope = %scope, "language selected in dropdown");
            return Ok(LanguageChoice::Custom(scope));
        }

        warn!(language, "language not offered, keeping page default");
        Ok(LanguageChoice::Unavailable)
    }

    /// Replace the content of a text field.
    pub async fn fill_field(&self, field: FieldRole, text: &str) -> Result<()> {
        let step = Step::FillField(field);
        let located = self
            .engine
            .finder()
            .find_visible_across_frames(input_role(field), self.config.timing.find_per_scope())
            .await
            .map_err(at(step))?;

        self.engine
            .interactor()
            .type_into(&located, text)
            .await
            .map_err(at(step))?;
        debug!(field = %field, scope = %located.scope, "field filled");
        Ok(())
    }

    /// Tick the terms checkbox, never its hyperlink.
    ///
    /// A visible checkbox is set directly. Otherwise the label is clicked
    /// just inside its left edge and the (possibly hidden) checkbox is then
    /// checked and corrected by script.
    pub async fn accept_terms(&self) -> Result<TermsPath> {
        let finder = self.engine.finder();
        let interactor = self.engine.interactor();
        let per_scope = self.config.timing.find_per_scope();

        match finder
            .find_visible_across_frames(Role::TermsCheckbox, per_scope)
            .await
        {
            Ok(checkbox) => {
                interactor
                    .set_checkbox(&checkbox, true)
                    .await
                    .map_err(at(Step::AcceptTerms))?;
                info!(scope = %checkbox.scope, "terms accepted via checkbox");
                return Ok(TermsPath::Checkbox(checkbox.scope));
            }
            Err(e) if e.is_not_found() => debug!("no visible terms checkbox, trying label"),
            Err(e) => return Err(at(Step::AcceptTerms)(e)),
        }

        let label = finder
            .find_visible_across_frames(Role::TermsLabel, per_scope)
            .await
            .map_err(at(Step::AcceptTerms))?;
        interactor
            .click_near_left_edge(&label, LABEL_CLICK_INSET)
            .await
            .map_err(at(Step::AcceptTerms))?;

        match finder.find_present_across_frames(Role::TermsCheckbox).await {
            Ok(checkbox) => interactor
                .force_checkbox(&checkbox, true)
                .await
                .map_err(at(Step::AcceptTerms))?,
            Err(e) if e.is_not_found() => debug!("no checkbox behind the label to verify"),
            Err(e) => return Err(at(Step::AcceptTerms)(e)),
        }

        info!(scope = %label.scope, "terms accepted via label");
        Ok(TermsPath::Label(label.scope))
    }

    /// Click submit and wait for the outcome.
    pub async fn submit(&mut self) -> Result<SubmissionOutcome> {
        self.last_validation_error = None;
        let driver = self.engine.driver();

        let button = self
            .engine
            .finder()
            .find_visible_across_frames(Role::SubmitButton, self.config.timing.find_per_scope())
            .await
            .map_err(at(Step::Submit))?;
        let start_url = driver
            .current_url()
            .await
            .map_err(|e| at(Step::Submit)(DiscoveryError::from(e)))?;

        self.engine
            .interactor()
            .click(&button)
            .await
            .map_err(at(Step::Submit))?;

        if let Err(e) = driver.execute_script(SCROLL_TOP_SCRIPT, Vec::new()).await {
            debug!(error = %e, "scroll to top failed");
        }

        let outcome = self
            .engine
            .outcome_detector()
            .wait_for_outcome(&start_url)
            .await
            .map_err(at(Step::Submit))?;

        match &outcome {
            SubmissionOutcome::ValidationError(message) => {
                warn!(%message, "form rejected");
                self.last_validation_error = Some(message.clone());
            }
            SubmissionOutcome::Timeout => warn!("no confirmation or error detected"),
            SubmissionOutcome::Success(_) => {}
        }
        Ok(outcome)
    }

    /// Whether a confirmation message is shown.
    pub async fn confirmation_shown(&self) -> Result<bool> {
        let shown = self
            .engine
            .outcome_detector()
            .confirmation_shown(self.config.timing.find_per_scope())
            .await
            .map_err(at(Step::VerifyConfirmation))?;

        if !shown {
            if let Some(message) = &self.last_validation_error {
                info!(%message, "no confirmation; last validation error");
            }
        }
        Ok(shown)
    }

    /// Message of the last rejected submission.
    pub fn last_validation_error(&self) -> Option<&str> {
        self.last_validation_error.as_deref()
    }
}
