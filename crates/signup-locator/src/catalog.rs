//! Immutable role → candidate list catalog.

use crate::{
    definition::{CandidateList, Role},
    error::{CatalogError, Result},
    loader::CatalogLoader,
};
use signup_core::CatalogConfig;
use signup_driver::Locator;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Catalog compiled into the binary.
const BUILTIN: &str = include_str!("../catalog/default.toml");

/// One parsed catalog document.
#[derive(Debug, Clone, Default)]
pub struct CatalogFile {
    /// Where the document came from (path or "builtin")
    pub origin: String,
    /// Candidate lists keyed by role
    pub lists: BTreeMap<Role, CandidateList>,
}

impl CatalogFile {
    /// Parse a catalog document.
    ///
    /// # Errors
    /// Returns error on malformed TOML or unknown role keys.
    pub fn parse(contents: &str, origin: &str) -> Result<Self> {
        let raw: BTreeMap<String, CandidateList> =
            toml::from_str(contents).map_err(|e| CatalogError::ParseError {
                path: origin.to_string(),
                source: e,
            })?;

        let mut lists = BTreeMap::new();
        for (key, list) in raw {
            let role: Role = key.parse()?;
            list.validate(role)?;
            lists.insert(role, list);
        }

        Ok(Self {
            origin: origin.to_string(),
            lists,
        })
    }
}

/// Candidate lists for every role, built once at startup.
///
/// Lookups never touch the browser; strategies are turned into fresh
/// [`Locator`]s on every call.
#[derive(Debug, Clone)]
pub struct LocatorCatalog {
    lists: BTreeMap<Role, CandidateList>,
}

impl LocatorCatalog {
    /// The built-in catalog.
    ///
    /// # Errors
    /// Returns error if the embedded catalog is malformed or incomplete.
    pub fn builtin() -> Result<Self> {
        Self::from_file(CatalogFile::parse(BUILTIN, "builtin")?)
    }

    /// Build a catalog from a single, complete document.
    ///
    /// # Errors
    /// Returns error if any role is missing.
    pub fn from_file(file: CatalogFile) -> Result<Self> {
        let catalog = Self { lists: file.lists };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Built-in catalog overlaid with the user catalog named in the config, if any.
    ///
    /// # Errors
    /// Returns error if the user catalog path is missing or the result is invalid.
    pub fn load(config: &CatalogConfig) -> Result<Self> {
        let mut catalog = Self::builtin()?;

        if let Some(path) = &config.path {
            let loader = CatalogLoader::new(path)?;
            for file in loader.load_all()? {
                catalog.overlay(file)?;
            }
        }

        info!(roles = catalog.lists.len(), "locator catalog ready");
        Ok(catalog)
    }

    /// Merge a document into this catalog role by role.
    ///
    /// # Errors
    /// Returns error if a merged list ends up invalid.
    pub fn overlay(&mut self, file: CatalogFile) -> Result<()> {
        for (role, list) in file.lists {
            debug!(
                role = %role,
                merge = ?list.merge,
                strategies = list.len(),
                origin = %file.origin,
                "applying catalog overlay"
            );
            match self.lists.get_mut(&role) {
                Some(existing) => {
                    existing.merge_from(list);
                    existing.validate(role)?;
                }
                None => {
                    self.lists.insert(role, list);
                }
            }
        }
        Ok(())
    }

    /// Candidate list for a role.
    #[must_use]
    pub fn get(&self, role: Role) -> Option<&CandidateList> {
        self.lists.get(&role)
    }

    /// Fresh driver queries for a role, in priority order.
    #[must_use]
    pub fn locators(&self, role: Role) -> Vec<Locator> {
        self.get(role).map(CandidateList::locators).unwrap_or_default()
    }

    /// Check that every role has a valid list.
    ///
    /// # Errors
    /// Returns the first missing or invalid role.
    pub fn validate(&self) -> Result<()> {
        for role in Role::ALL {
            let list = self.get(role).ok_or_else(|| CatalogError::MissingRole {
                role: role.to_string(),
            })?;
            list.validate(role)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{MergeMode, Strategy};

    #[test]
    fn test_builtin_is_complete() {
        let catalog = LocatorCatalog::builtin().expect("builtin catalog");
        for role in Role::ALL {
            assert!(!catalog.locators(role).is_empty(), "no strategies for {role}");
        }
    }

    #[test]
    fn test_builtin_orders() {
        let catalog = LocatorCatalog::builtin().expect("builtin catalog");

        let toggles = catalog.get(Role::LanguageToggle).unwrap();
        assert_eq!(
            toggles.strategies[0],
            Strategy::Css("span.ui-select-toggle".to_string())
        );

        let options = catalog.get(Role::LanguageOption).unwrap();
        assert_eq!(
            options.strategies.last(),
            Some(&Strategy::Tag("option".to_string()))
        );

        // The generic checkbox selector is the last resort
        let checkboxes = catalog.get(Role::TermsCheckbox).unwrap();
        assert_eq!(
            checkboxes.strategies.last(),
            Some(&Strategy::Css("input[type='checkbox']".to_string()))
        );

        assert_eq!(
            catalog.locators(Role::Frame),
            vec![Locator::css("iframe, frame")]
        );
    }

    #[test]
    fn test_outcome_banners_do_not_match_page_copy() {
        let catalog = LocatorCatalog::builtin().expect("builtin catalog");

        for strategy in &catalog.get(Role::SuccessBanner).unwrap().strategies {
            let selector = strategy.value().to_lowercase();
            assert!(!selector.contains("welcome"), "phrase match in {selector}");
            assert!(!selector.contains("normalize-space"), "text match in {selector}");
        }
        for strategy in &catalog.get(Role::ErrorBanner).unwrap().strategies {
            let selector = strategy.value().to_lowercase();
            assert!(!selector.contains("please"), "keyword match in {selector}");
            assert!(!selector.contains("translate("), "text match in {selector}");
        }
    }

    #[test]
    fn test_overlay_prepend() {
        let mut catalog = LocatorCatalog::builtin().expect("builtin catalog");
        let before = catalog.get(Role::NameInput).unwrap().len();

        let file = CatalogFile::parse(
            r##"
[name_input]
merge = "prepend"
strategies = [{ css = "#full-name" }]
"##,
            "test",
        )
        .expect("parse overlay");
        assert_eq!(file.lists[&Role::NameInput].merge, MergeMode::Prepend);

        catalog.overlay(file).expect("apply overlay");
        let list = catalog.get(Role::NameInput).unwrap();
        assert_eq!(list.len(), before + 1);
        assert_eq!(list.strategies[0], Strategy::Css("#full-name".to_string()));
    }

    #[test]
    fn test_overlay_replace_keeps_other_roles() {
        let mut catalog = LocatorCatalog::builtin().expect("builtin catalog");
        let file = CatalogFile::parse(
            r#"
[submit_button]
strategies = [{ xpath = "//button[@id='go']" }]
"#,
            "test",
        )
        .expect("parse overlay");

        catalog.overlay(file).expect("apply overlay");
        assert_eq!(catalog.get(Role::SubmitButton).unwrap().len(), 1);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let result = CatalogFile::parse("[langauge]\nstrategies = [{ css = \"x\" }]\n", "test");
        assert!(matches!(result, Err(CatalogError::UnknownRole { .. })));
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        let result = CatalogFile::parse("[frame]\nstrategies = []\n", "test");
        assert!(matches!(result, Err(CatalogError::ValidationError { .. })));
    }

    #[test]
    fn test_incomplete_catalog() {
        let file = CatalogFile::parse("[frame]\nstrategies = [{ tag = \"iframe\" }]\n", "test")
            .expect("parse");
        assert!(matches!(
            LocatorCatalog::from_file(file),
            Err(CatalogError::MissingRole { .. })
        ));
    }

    #[test]
    fn test_load_without_user_catalog() {
        let catalog = LocatorCatalog::load(&CatalogConfig::default()).expect("load catalog");
        assert!(catalog.validate().is_ok());
    }
}
