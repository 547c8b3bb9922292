//! Candidate list types and structures.
//!
//! A catalog file maps each [`Role`] to a [`CandidateList`]: an ordered set
//! of selection strategies tried first to last.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use signup_driver::Locator;
use std::fmt;
use std::str::FromStr;

/// Semantic role of an element on the sign-up page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Control that opens a custom language dropdown
    LanguageToggle,
    /// Entry inside an opened custom dropdown
    LanguageOption,
    /// Name text input
    NameInput,
    /// Organization text input
    OrganizationInput,
    /// E-mail text input
    EmailInput,
    /// Terms-and-conditions checkbox
    TermsCheckbox,
    /// Label text of the terms checkbox (may embed a hyperlink)
    TermsLabel,
    /// Form submit button
    SubmitButton,
    /// Confirmation banner shown after a successful sign-up
    SuccessBanner,
    /// Inline validation message
    ErrorBanner,
    /// Native `<select>` element
    NativeSelect,
    /// `<option>` inside a native select
    NativeOption,
    /// Embedded frame in the top document
    Frame,
}

impl Role {
    /// Every role, in catalog order.
    pub const ALL: [Role; 13] = [
        Role::LanguageToggle,
        Role::LanguageOption,
        Role::NameInput,
        Role::OrganizationInput,
        Role::EmailInput,
        Role::TermsCheckbox,
        Role::TermsLabel,
        Role::SubmitButton,
        Role::SuccessBanner,
        Role::ErrorBanner,
        Role::NativeSelect,
        Role::NativeOption,
        Role::Frame,
    ];

    /// Key used for this role in catalog files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanguageToggle => "language_toggle",
            Self::LanguageOption => "language_option",
            Self::NameInput => "name_input",
            Self::OrganizationInput => "organization_input",
            Self::EmailInput => "email_input",
            Self::TermsCheckbox => "terms_checkbox",
            Self::TermsLabel => "terms_label",
            Self::SubmitButton => "submit_button",
            Self::SuccessBanner => "success_banner",
            Self::ErrorBanner => "error_banner",
            Self::NativeSelect => "native_select",
            Self::NativeOption => "native_option",
            Self::Frame => "frame",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownRole {
                name: s.to_string(),
            })
    }
}

/// One way of locating elements.
///
/// Written in TOML as a single-key inline table, e.g. `{ css = "span.toggle" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// CSS selector
    Css(String),
    /// XPath 1.0 expression
    Xpath(String),
    /// Element tag name
    Tag(String),
    /// Value of the `name` attribute
    Name(String),
    /// Exact anchor text
    LinkText(String),
}

impl Strategy {
    /// The raw selector text.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v) | Self::Xpath(v) | Self::Tag(v) | Self::Name(v) | Self::LinkText(v) => v,
        }
    }

    /// Driver query for this strategy.
    #[must_use]
    pub fn to_locator(&self) -> Locator {
        match self {
            Self::Css(v) => Locator::css(v.as_str()),
            Self::Xpath(v) => Locator::xpath(v.as_str()),
            Self::Tag(v) => Locator::tag(v.as_str()),
            Self::Name(v) => Locator::name(v),
            Self::LinkText(v) => Locator::link_text(v.as_str()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(v) => write!(f, "css={v}"),
            Self::Xpath(v) => write!(f, "xpath={v}"),
            Self::Tag(v) => write!(f, "tag={v}"),
            Self::Name(v) => write!(f, "name={v}"),
            Self::LinkText(v) => write!(f, "link_text={v}"),
        }
    }
}

/// How an overlay list combines with the list it overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Overlay strategies replace the base list
    #[default]
    Replace,
    /// Overlay strategies are tried before the base list
    Prepend,
    /// Overlay strategies are tried after the base list
    Append,
}

/// Priority-ordered strategies for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    /// Human-readable note on what the list targets
    #[serde(default)]
    pub description: String,

    /// Strategies, most specific first
    pub strategies: Vec<Strategy>,

    /// Combination rule when this list is an overlay
    #[serde(default)]
    pub merge: MergeMode,
}

impl CandidateList {
    /// Create a list from strategies.
    #[must_use]
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self {
            description: String::new(),
            strategies,
            merge: MergeMode::Replace,
        }
    }

    /// Driver queries in list order.
    #[must_use]
    pub fn locators(&self) -> Vec<Locator> {
        self.strategies.iter().map(Strategy::to_locator).collect()
    }

    /// Number of strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the list has no strategies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Combine `overlay` into this list according to its merge mode.
    pub fn merge_from(&mut self, overlay: CandidateList) {
        match overlay.merge {
            MergeMode::Replace => {
                self.strategies = overlay.strategies;
                if !overlay.description.is_empty() {
                    self.description = overlay.description;
                }
            }
            MergeMode::Prepend => {
                let mut strategies = overlay.strategies;
                strategies.append(&mut self.strategies);
                self.strategies = strategies;
            }
            MergeMode::Append => self.strategies.extend(overlay.strategies),
        }
    }

    /// Validate the list for use under `role`.
    pub fn validate(&self, role: Role) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(CatalogError::ValidationError {
                role: role.to_string(),
                reason: "candidate list must contain at least one strategy".to_string(),
            });
        }

        if let Some(empty) = self.strategies.iter().find(|s| s.value().trim().is_empty()) {
            return Err(CatalogError::ValidationError {
                role: role.to_string(),
                reason: format!("strategy {empty} has an empty selector"),
            });
        }

        Ok(())
    }
}

impl fmt::Display for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.strategies.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signup_driver::Using;

    #[test]
    fn test_role_round_trip_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!(matches!(
            "language".parse::<Role>(),
            Err(CatalogError::UnknownRole { .. })
        ));
    }

    #[test]
    fn test_strategy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategies: Vec<Strategy>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"strategies = [{ css = "span.ui-select-toggle" }, { name = "orgName" }, { tag = "option" }]"#,
        )
        .expect("parse strategies");

        assert_eq!(
            wrapper.strategies,
            vec![
                Strategy::Css("span.ui-select-toggle".to_string()),
                Strategy::Name("orgName".to_string()),
                Strategy::Tag("option".to_string()),
            ]
        );
    }

    #[test]
    fn test_strategy_to_locator() {
        assert_eq!(
            Strategy::Name("email".to_string()).to_locator(),
            Locator::css("[name=\"email\"]")
        );
        assert_eq!(
            Strategy::Xpath("//button".to_string()).to_locator().using,
            Using::XPath
        );
    }

    #[test]
    fn test_merge_modes() {
        let base = CandidateList::new(vec![Strategy::Css("a".to_string())]);

        let mut replaced = base.clone();
        replaced.merge_from(CandidateList::new(vec![Strategy::Css("b".to_string())]));
        assert_eq!(replaced.strategies, vec![Strategy::Css("b".to_string())]);

        let mut prepended = base.clone();
        prepended.merge_from(CandidateList {
            merge: MergeMode::Prepend,
            ..CandidateList::new(vec![Strategy::Css("b".to_string())])
        });
        assert_eq!(prepended.to_string(), "[css=b, css=a]");

        let mut appended = base;
        appended.merge_from(CandidateList {
            merge: MergeMode::Append,
            ..CandidateList::new(vec![Strategy::Css("b".to_string())])
        });
        assert_eq!(appended.to_string(), "[css=a, css=b]");
    }

    #[test]
    fn test_validate() {
        assert!(CandidateList::new(vec![]).validate(Role::NameInput).is_err());
        assert!(CandidateList::new(vec![Strategy::Css("  ".to_string())])
            .validate(Role::NameInput)
            .is_err());
        assert!(CandidateList::new(vec![Strategy::Css("input".to_string())])
            .validate(Role::NameInput)
            .is_ok());
    }
}
