//! Configuration management for the sign-up checker.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/signup-check/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page under test
    pub target: TargetConfig,
    /// WebDriver session settings
    pub browser: BrowserConfig,
    /// Polling intervals and wait budgets
    pub timing: TimingConfig,
    /// Submission outcome classification
    pub outcome: OutcomeConfig,
    /// Language dropdown expectations
    pub languages: LanguageConfig,
    /// Data typed into the form
    pub profile: ProfileConfig,
    /// Locator catalog overrides
    pub catalog: CatalogConfig,
    /// Failure artifacts
    pub report: ReportConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply `SIGNUP_*` environment overrides in place.
    ///
    /// - `SIGNUP_TARGET_URL`: the page under test
    /// - `SIGNUP_WEBDRIVER_URL`: the WebDriver server URL
    /// - `SIGNUP_HEADLESS`: browser headless mode (true/false)
    /// - `SIGNUP_CATALOG`: path to a locator catalog overlay
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SIGNUP_TARGET_URL") {
            tracing::debug!("Override target.url from env: {}", url);
            self.target.url = url;
        }

        if let Some(url) = lookup("SIGNUP_WEBDRIVER_URL") {
            tracing::debug!("Override browser.webdriver_url from env: {}", url);
            self.browser.webdriver_url = url;
        }

        if let Some(val) = lookup("SIGNUP_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(path) = lookup("SIGNUP_CATALOG") {
            tracing::debug!("Override catalog.path from env: {}", path);
            self.catalog.path = Some(PathBuf::from(path));
        }
    }

    /// Check values that would make the polling loops or navigation meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        check_url("target.url", &self.target.url)?;
        check_url("browser.webdriver_url", &self.browser.webdriver_url)?;

        let timing = &self.timing;
        for (field, value) in [
            ("timing.poll_interval_ms", timing.poll_interval_ms),
            ("timing.option_poll_ms", timing.option_poll_ms),
            ("timing.outcome_poll_ms", timing.outcome_poll_ms),
            ("timing.find_per_scope_ms", timing.find_per_scope_ms),
            ("timing.submit_budget_ms", timing.submit_budget_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        if timing.submit_budget_ms < timing.outcome_poll_ms {
            return Err(invalid(
                "timing.submit_budget_ms",
                "must be at least timing.outcome_poll_ms",
            ));
        }

        if self.languages.required.is_empty() {
            return Err(invalid("languages.required", "needs at least one group"));
        }
        if self
            .languages
            .required
            .iter()
            .any(|group| group.iter().all(|label| label.trim().is_empty()))
        {
            return Err(invalid(
                "languages.required",
                "every group needs a non-empty label",
            ));
        }

        if self.outcome.success_phrases.is_empty() {
            return Err(invalid("outcome.success_phrases", "cannot be empty"));
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/signup-check/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("com", "signup-check", "signup-check").ok_or(ConfigError::NoConfigDir)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn check_url(field: &str, value: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, &e.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(invalid(field, "URL has no host"));
    }
    Ok(())
}

/// Page under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// URL of the sign-up page
    pub url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: "http://jt-dev.azurewebsites.net/#/SignUp".to_string(),
        }
    }
}

/// WebDriver session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// URL of a running W3C WebDriver server (chromedriver, geckodriver, ...)
    pub webdriver_url: String,
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// W3C page load strategy: `normal`, `eager` or `none`
    pub page_load_strategy: String,
    /// Extra browser command-line arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            window_width: 1920,
            window_height: 1080,
            page_load_strategy: "eager".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Polling intervals and wait budgets, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Finder budget per scope (top document, then each frame)
    pub find_per_scope_ms: u64,
    /// Sleep between finder iterations
    pub poll_interval_ms: u64,
    /// Wait for an element to become visible and enabled before a native click
    pub clickable_timeout_ms: u64,
    /// Wait for document readiness and framework settle after navigation
    pub page_ready_timeout_ms: u64,
    /// Pause after opening a custom dropdown before scanning options
    pub render_settle_ms: u64,
    /// Window for collecting option texts from an opened dropdown
    pub option_read_window_ms: u64,
    /// Sleep between option collection passes
    pub option_poll_ms: u64,
    /// Budget for detecting the submission outcome
    pub submit_budget_ms: u64,
    /// Sleep between outcome detector passes
    pub outcome_poll_ms: u64,
}

impl TimingConfig {
    /// Finder budget per scope.
    #[must_use]
    pub fn find_per_scope(&self) -> Duration {
        Duration::from_millis(self.find_per_scope_ms)
    }

    /// Finder poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Clickable wait bound.
    #[must_use]
    pub fn clickable_timeout(&self) -> Duration {
        Duration::from_millis(self.clickable_timeout_ms)
    }

    /// Page readiness bound.
    #[must_use]
    pub fn page_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.page_ready_timeout_ms)
    }

    /// Dropdown render settle delay.
    #[must_use]
    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    /// Option collection window.
    #[must_use]
    pub fn option_read_window(&self) -> Duration {
        Duration::from_millis(self.option_read_window_ms)
    }

    /// Option collection poll interval.
    #[must_use]
    pub fn option_poll(&self) -> Duration {
        Duration::from_millis(self.option_poll_ms)
    }

    /// Submission outcome budget.
    #[must_use]
    pub fn submit_budget(&self) -> Duration {
        Duration::from_millis(self.submit_budget_ms)
    }

    /// Outcome detector poll interval.
    #[must_use]
    pub fn outcome_poll(&self) -> Duration {
        Duration::from_millis(self.outcome_poll_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            find_per_scope_ms: 3000,
            poll_interval_ms: 80,
            clickable_timeout_ms: 15_000,
            page_ready_timeout_ms: 15_000,
            render_settle_ms: 100,
            option_read_window_ms: 2000,
            option_poll_ms: 80,
            submit_budget_ms: 8000,
            outcome_poll_ms: 120,
        }
    }
}

/// Submission outcome classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// Fragments that must all appear in the page text for a success (case-insensitive)
    pub success_phrases: Vec<String>,
    /// An error banner only counts when its text contains one of these (case-insensitive)
    pub validation_keywords: Vec<String>,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            success_phrases: vec!["welcome email".to_string(), "check your email".to_string()],
            validation_keywords: vec![
                "required".to_string(),
                "invalid".to_string(),
                "please".to_string(),
            ],
        }
    }
}

/// Language dropdown expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Each group must have at least one label present (case-insensitive)
    pub required: Vec<Vec<String>>,
    /// Language to select, matched exactly against option text
    pub preferred: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            required: vec![
                vec!["English".to_string()],
                vec!["Dutch".to_string(), "Nederlands".to_string()],
            ],
            preferred: "English".to_string(),
        }
    }
}

/// Data typed into the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Value for the name input
    pub name: String,
    /// Value for the organization input
    pub organization: String,
    /// Local part prefix; a millisecond stamp is appended per run
    pub email_prefix: String,
    /// Email domain
    pub email_domain: String,
}

impl ProfileConfig {
    /// Build a unique email address from the prefix, a stamp and the domain.
    #[must_use]
    pub fn email_with_stamp(&self, stamp: i64) -> String {
        format!("{}{}@{}", self.email_prefix, stamp, self.email_domain)
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: "Signup Tester".to_string(),
            organization: "Signup Tester".to_string(),
            email_prefix: "signup".to_string(),
            email_domain: "test.com".to_string(),
        }
    }
}

/// Locator catalog overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// TOML file overlaid on the builtin catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Failure artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory for failure screenshots; disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_dir: Option<PathBuf>,
}
