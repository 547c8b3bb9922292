//! `signup-check`: run the sign-up form check against a WebDriver server.
//!
//! ## Usage
//!
//! ```bash
//! chromedriver --port=9515 &
//! signup-check                                  # defaults / config file
//! signup-check --url http://localhost:8080/#/SignUp --headless
//! signup-check --config ./check.toml --screenshot-dir ./shots
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use signup_core::AppConfig;
use signup_driver::{SessionCapabilities, WebDriverSession};
use signup_flow::{run_signup, save_failure_screenshot, RunReport, SignUpPage};
use signup_locator::LocatorCatalog;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Validate a web sign-up form end to end.
#[derive(Debug, Parser)]
#[command(name = "signup-check", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sign-up page URL
    #[arg(long)]
    url: Option<String>,

    /// WebDriver server URL
    #[arg(long)]
    webdriver: Option<String>,

    /// Run the browser headless
    #[arg(long)]
    headless: bool,

    /// Language to select
    #[arg(long)]
    language: Option<String>,

    /// Locator catalog overlay (file or directory)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(long)]
    screenshot_dir: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AppConfig::load()?,
        };
        config.apply_env();

        if let Some(url) = &self.url {
            config.target.url.clone_from(url);
        }
        if let Some(url) = &self.webdriver {
            config.browser.webdriver_url.clone_from(url);
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(language) = &self.language {
            config.languages.preferred.clone_from(language);
        }
        if let Some(path) = &self.catalog {
            config.catalog.path = Some(path.clone());
        }
        if let Some(dir) = &self.screenshot_dir {
            config.report.screenshot_dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,signup=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(report) if report.passed() => ExitCode::SUCCESS,
        Ok(report) => {
            error!(
                languages = report.languages_available,
                outcome = %report.outcome,
                confirmed = report.confirmed,
                "sign-up check failed"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let config = cli.load_config()?;
    let catalog = LocatorCatalog::load(&config.catalog)?;
    info!(
        url = %config.target.url,
        webdriver = %config.browser.webdriver_url,
        "starting sign-up check v{}",
        env!("CARGO_PKG_VERSION")
    );

    let capabilities = SessionCapabilities::chrome(&config.browser);
    let session = WebDriverSession::connect(&config.browser.webdriver_url, &capabilities)
        .await
        .with_context(|| format!("connecting to {}", config.browser.webdriver_url))?;

    let stamp = chrono::Utc::now().timestamp_millis();
    let result = {
        let mut page = SignUpPage::new(&session, &catalog, &config);
        run_signup(&mut page, &config.profile, &config.languages.preferred, stamp).await
    };

    if let (Err(e), Some(dir)) = (&result, &config.report.screenshot_dir) {
        if let Some(step) = e.step() {
            if let Err(shot) = save_failure_screenshot(&session, dir, step).await {
                warn!(error = %shot, "could not save failure screenshot");
            }
        }
    }

    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close WebDriver session");
    }

    Ok(result?)
}
