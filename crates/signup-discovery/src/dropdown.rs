//! Dropdown protocol for custom widgets and native `<select>` elements.
//!
//! A custom dropdown goes Closed → Open → (option chosen | Closed). Every
//! displayed toggle of every toggle strategy is tried in turn; a toggle
//! that errors or shows no matching option is closed with Escape and the
//! next one is tried.

use crate::error::{DiscoveryError, Result};
use crate::finder::Finder;
use crate::interact::Interactor;
use crate::poll::{poll_until, PollPolicy};
use signup_core::Scope;
use signup_driver::{Driver, DriverError, ElementRef, Locator};
use signup_locator::Role;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace};

/// Result of trying to pick an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// The option was clicked
    Chosen,
    /// No toggle offered the option
    NotFound,
}

/// Opens dropdowns, reads their options and picks one.
pub struct DropdownProtocol<'a, D: ?Sized> {
    finder: Finder<'a, D>,
    interactor: Interactor<'a, D>,
    settle: Duration,
    read: PollPolicy,
}

impl<'a, D: Driver + ?Sized> DropdownProtocol<'a, D> {
    /// Create the protocol.
    ///
    /// `settle` is the pause after opening before options are scanned;
    /// `read` bounds option collection on each opened dropdown.
    pub fn new(
        finder: Finder<'a, D>,
        interactor: Interactor<'a, D>,
        settle: Duration,
        read: PollPolicy,
    ) -> Self {
        Self {
            finder,
            interactor,
            settle,
            read,
        }
    }

    fn driver(&self) -> &'a D {
        self.finder.navigator().driver()
    }

    fn locators(&self, role: Role) -> Vec<Locator> {
        self.finder.navigator().catalog().locators(role)
    }

    /// Elements matching `locator` in the current scope; non-fatal errors yield none.
    async fn query(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        match self.driver().find_all(locator).await {
            Ok(found) => Ok(found),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                trace!(locator = %locator, error = %e, "query failed");
                Ok(Vec::new())
            }
        }
    }

    async fn open(&self, toggle: &ElementRef) -> Result<bool> {
        if !self.driver().is_displayed(toggle).await? {
            return Ok(false);
        }
        self.interactor.scroll_into_view(toggle).await;
        self.interactor.click_element(toggle).await?;
        Ok(true)
    }

    /// Displayed option in the current scope whose trimmed text is exactly `target`.
    async fn option_with_text(&self, options: &[Locator], target: &str) -> Result<Option<ElementRef>> {
        let driver = self.driver();
        for locator in options {
            let Ok(items) = driver.find_all(locator).await else {
                continue;
            };
            for item in items {
                let matches = async {
                    Ok::<_, DriverError>(
                        driver.is_displayed(&item).await? && driver.text(&item).await?.trim() == target,
                    )
                };
                match matches.await {
                    Ok(true) => return Ok(Some(item)),
                    Ok(false) => {}
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => trace!(error = %e, "option check failed"),
                }
            }
        }
        Ok(None)
    }

    /// Distinct, trimmed, non-blank texts of displayed options in the current scope.
    async fn collect_option_texts(&self, options: &[Locator]) -> Result<Vec<String>> {
        let driver = self.driver();
        let mut texts: Vec<String> = Vec::new();
        for locator in options {
            let items = match driver.find_all(locator).await {
                Ok(items) => items,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(_) => continue,
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
                        if !text.is_empty() && !texts.iter().any(|t| t == text) {
                            texts.push(text.to_string());
                        }
                    }
                    Ok(None) => {}
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => trace!(error = %e, "option read failed"),
                }
            }
        }
        Ok(texts)
    }

    /// Open custom dropdowns in the current scope until one offers `target`, and click it.
    pub async fn open_and_choose_option(&self, target: &str) -> Result<Choice> {
        let options = self.locators(Role::LanguageOption);

        for toggle_locator in self.locators(Role::LanguageToggle) {
            for toggle in self.query(&toggle_locator).await? {
                let attempt = async {
                    if !self.open(&toggle).await? {
                        return Ok(false);
                    }
                    sleep(self.settle).await;

                    if let Some(option) = self.option_with_text(&options, target).await? {
                        self.interactor.scroll_into_view(&option).await;
                        if let Err(e) = self.interactor.click_element(&option).await {
                            self.interactor.press_escape(&toggle).await;
                            return Err(e);
                        }
                        return Ok(true);
                    }
                    self.interactor.press_escape(&toggle).await;
                    Ok::<_, DiscoveryError>(false)
                };

                match attempt.await {
                    Ok(true) => {
                        debug!(toggle = %toggle_locator, option = target, "option chosen");
                        return Ok(Choice::Chosen);
                    }
                    Ok(false) => {}
                    Err(DiscoveryError::Driver(e)) if e.is_fatal() => return Err(e.into()),
                    Err(e) => debug!(toggle = %toggle_locator, error = %e, "toggle failed, trying next"),
                }
            }
        }

        Ok(Choice::NotFound)
    }

    /// Open custom dropdowns in the current scope and return the first non-empty option list.
    ///
    /// Texts are trimmed, non-blank and distinct, in the order first seen.
    pub async fn read_all_option_texts(&self) -> Result<Vec<String>> {
        let options = self.locators(Role::LanguageOption);
        let options = &options;

        for toggle_locator in self.locators(Role::LanguageToggle) {
            for toggle in self.query(&toggle_locator).await? {
                let attempt = async {
                    if !self.open(&toggle).await? {
                        return Ok(None);
                    }
                    let texts = poll_until(self.read, move || async move {
                        let texts = self.collect_option_texts(options).await?;
                        Ok::<_, DiscoveryError>((!texts.is_empty()).then_some(texts))
                    })
                    .await?;
                    if texts.is_none() {
                        self.interactor.press_escape(&toggle).await;
                    }
                    Ok::<_, DiscoveryError>(texts)
                };

                match attempt.await {
                    Ok(Some(texts)) => {
                        debug!(toggle = %toggle_locator, count = texts.len(), "read dropdown options");
                        return Ok(texts);
                    }
                    Ok(None) => {}
                    Err(DiscoveryError::Driver(e)) if e.is_fatal() => return Err(e.into()),
                    Err(e) => debug!(toggle = %toggle_locator, error = %e, "toggle failed, trying next"),
                }
            }
        }

        Ok(Vec::new())
    }

    /// Distinct option texts of every native `<select>` in the current scope.
    pub async fn read_native_options(&self) -> Result<Vec<String>> {
        let driver = self.driver();
        let option_locators = self.locators(Role::NativeOption);
        let mut texts: Vec<String> = Vec::new();

        for select_locator in self.locators(Role::NativeSelect) {
            for select in self.query(&select_locator).await? {
                for option_locator in &option_locators {
                    let options = match driver.find_all_within(&select, option_locator).await {
                        Ok(options) => options,
                        Err(e) if e.is_fatal() => return Err(e.into()),
                        Err(_) => continue,
                    };
                    for option in options {
                        match driver.text(&option).await {
                            Ok(text) => {
                                let text = text.trim();
                                if !text.is_empty() && !texts.iter().any(|t| t == text) {
                                    texts.push(text.to_string());
                                }
                            }
                            Err(e) if e.is_fatal() => return Err(e.into()),
                            Err(_) => {}
                        }
                    }
                }
            }
        }

        Ok(texts)
    }

    /// Select `text` in the first displayed native `<select>` of the current scope that offers it.
    pub async fn select_native_option(&self, text: &str) -> Result<Choice> {
        let driver = self.driver();
        let option_locators = self.locators(Role::NativeOption);

        for select_locator in self.locators(Role::NativeSelect) {
            for select in self.query(&select_locator).await? {
                if !driver.is_displayed(&select).await.unwrap_or(false) {
                    continue;
                }
                self.interactor.scroll_into_view(&select).await;

                for option_locator in &option_locators {
                    let Ok(options) = driver.find_all_within(&select, option_locator).await else {
                        continue;
                    };
                    for option in options {
                        let Ok(option_text) = driver.text(&option).await else {
                            continue;
                        };
                        if option_text.trim() != text {
                            continue;
                        }
                        match self.interactor.click_element(&option).await {
                            Ok(()) => {
                                debug!(option = text, "native option selected");
                                return Ok(Choice::Chosen);
                            }
                            Err(DiscoveryError::Driver(e)) if e.is_fatal() => {
                                return Err(e.into())
                            }
                            Err(e) => debug!(error = %e, "native option click failed"),
                        }
                    }
                }
            }
        }

        Ok(Choice::NotFound)
    }

    /// [`open_and_choose_option`](Self::open_and_choose_option) in the top document, then each frame.
    pub async fn choose_in_any_scope(&self, target: &str) -> Result<Option<Scope>> {
        self.finder
            .navigator()
            .for_each_scope(move |scope| async move {
                Ok((self.open_and_choose_option(target).await? == Choice::Chosen).then_some(scope))
            })
            .await
    }

    /// [`read_all_option_texts`](Self::read_all_option_texts) in each scope; first non-empty list wins.
    pub async fn read_options_in_any_scope(&self) -> Result<Vec<String>> {
        let texts = self
            .finder
            .navigator()
            .for_each_scope(move |_| async move {
                let texts = self.read_all_option_texts().await?;
                Ok((!texts.is_empty()).then_some(texts))
            })
            .await?;
        Ok(texts.unwrap_or_default())
    }

    /// [`read_native_options`](Self::read_native_options) in each scope; first non-empty list wins.
    pub async fn read_native_in_any_scope(&self) -> Result<Vec<String>> {
        let texts = self
            .finder
            .navigator()
            .for_each_scope(move |_| async move {
                let texts = self.read_native_options().await?;
                Ok((!texts.is_empty()).then_some(texts))
            })
            .await?;
        Ok(texts.unwrap_or_default())
    }

    /// [`select_native_option`](Self::select_native_option) in the top document, then each frame.
    pub async fn select_native_in_any_scope(&self, text: &str) -> Result<Option<Scope>> {
        self.finder
            .navigator()
            .for_each_scope(move |scope| async move {
                Ok((self.select_native_option(text).await? == Choice::Chosen).then_some(scope))
            })
            .await
    }

    /// Whether an element whose own text is exactly `text` is displayed in any scope.
    pub async fn text_visible_in_any_scope(&self, text: &str) -> Result<bool> {
        let locator = [Locator::exact_text(text)];
        let locator = &locator;
        let finder = self.finder;
        let found = self
            .finder
            .navigator()
            .for_each_scope(move |_| async move {
                Ok(finder.any_visible(locator).await?.then_some(()))
            })
            .await?;
        Ok(found.is_some())
    }
}
