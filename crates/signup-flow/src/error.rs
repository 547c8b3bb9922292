//! Error types for the sign-up workflow.

use signup_core::FieldRole;
use signup_discovery::DiscoveryError;
use signup_driver::DriverError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A logical step of the sign-up workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Navigate and wait for the page to settle
    OpenPage,
    /// Check that the required languages are offered
    ValidateLanguages,
    /// Pick the preferred language
    SelectLanguage,
    /// Type into one text field
    FillField(FieldRole),
    /// Tick the terms checkbox
    AcceptTerms,
    /// Click submit and classify the outcome
    Submit,
    /// Look for the confirmation message
    VerifyConfirmation,
}

impl Step {
    /// Short identifier used in artifact file names.
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::OpenPage => "open_page".to_string(),
            Self::ValidateLanguages => "validate_languages".to_string(),
            Self::SelectLanguage => "select_language".to_string(),
            Self::FillField(field) => format!("fill_{}", field.label()),
            Self::AcceptTerms => "accept_terms".to_string(),
            Self::Submit => "submit".to_string(),
            Self::VerifyConfirmation => "verify_confirmation".to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenPage => write!(f, "open sign-up page"),
            Self::ValidateLanguages => write!(f, "validate languages"),
            Self::SelectLanguage => write!(f, "select language"),
            Self::FillField(field) => write!(f, "fill {} field", field.label()),
            Self::AcceptTerms => write!(f, "accept terms"),
            Self::Submit => write!(f, "submit form"),
            Self::VerifyConfirmation => write!(f, "verify confirmation"),
        }
    }
}

/// Errors that end the workflow.
#[derive(Error, Debug)]
pub enum FlowError {
    /// A step exhausted every discovery tier or hit an unrecoverable error
    #[error("{step} failed: {source}")]
    Step {
        /// Step that failed
        step: Step,
        /// Underlying discovery failure
        #[source]
        source: DiscoveryError,
    },

    /// Failure screenshot could not be taken
    #[error("screenshot failed: {0}")]
    Screenshot(#[from] DriverError),

    /// Failure screenshot could not be written
    #[error("failed to write {path}: {source}")]
    Artifact {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl FlowError {
    /// The step that failed, if this is a step failure.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Attach a step to a discovery error.
pub(crate) fn at(step: Step) -> impl FnOnce(DiscoveryError) -> FlowError {
    move |source| FlowError::Step { step, source }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_step_message_names_step_role_and_elapsed() {
        let err = at(Step::FillField(FieldRole::Name))(DiscoveryError::NotFound {
            role: "name_input".to_string(),
            attempted: "[css selector=[name=\"name\"]]".to_string(),
            elapsed: Duration::from_secs(3),
        });

        let message = err.to_string();
        assert!(message.starts_with("fill name field failed"));
        assert!(message.contains("name_input"));
        assert!(message.contains("3s"));
        assert_eq!(err.step(), Some(Step::FillField(FieldRole::Name)));
    }

    #[test]
    fn test_slugs_are_file_safe() {
        for step in [
            Step::OpenPage,
            Step::ValidateLanguages,
            Step::SelectLanguage,
            Step::FillField(FieldRole::Organization),
            Step::AcceptTerms,
            Step::Submit,
            Step::VerifyConfirmation,
        ] {
            let slug = step.slug();
            assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{slug}");
        }
    }
}
