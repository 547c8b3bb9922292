//! The end-to-end sign-up check.

use crate::error::Result;
use crate::language::LanguageChoice;
use crate::page::{SignUpPage, TermsPath};
use signup_core::{FieldRole, ProfileConfig};
use signup_discovery::SubmissionOutcome;
use signup_driver::Driver;
use tracing::info;

/// What one run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Every required language was offered
    pub languages_available: bool,
    /// How the preferred language was picked
    pub language: LanguageChoice,
    /// Address the form was submitted with
    pub email: String,
    /// Which control accepted the terms
    pub terms: TermsPath,
    /// Classification of the submission
    pub outcome: SubmissionOutcome,
    /// A confirmation was visible afterwards
    pub confirmed: bool,
}

impl RunReport {
    /// Whether the check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.languages_available && self.confirmed
    }
}

/// Open → validate/select language → fill fields → accept terms → submit → verify.
///
/// `stamp` makes the email address unique per run.
pub async fn run_signup<D: Driver + ?Sized>(
    page: &mut SignUpPage<'_, D>,
    profile: &ProfileConfig,
    preferred_language: &str,
    stamp: i64,
) -> Result<RunReport> {
    page.open_page().await?;

    let languages_available = page.languages_available().await?;
    let language = page.select_language(preferred_language).await?;

    let email = profile.email_with_stamp(stamp);
    page.fill_field(FieldRole::Name, &profile.name).await?;
    page.fill_field(FieldRole::Organization, &profile.organization).await?;
    page.fill_field(FieldRole::Email, &email).await?;

    let terms = page.accept_terms().await?;
    let outcome = page.submit().await?;
    let confirmed = page.confirmation_shown().await?;

    let report = RunReport {
        languages_available,
        language,
        email,
        terms,
        outcome,
        confirmed,
    };
    info!(
        languages = report.languages_available,
        language = %report.language,
        outcome = %report.outcome,
        confirmed = report.confirmed,
        "sign-up check finished"
    );
    Ok(report)
}
