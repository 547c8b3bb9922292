//! End-to-end tests of the discovery engine against the in-memory driver.

use signup_core::{OutcomeConfig, Scope, TimingConfig};
use signup_discovery::{Choice, DiscoveryEngine, SubmissionOutcome, SuccessSignal};
use signup_driver::mock::{Effect, MockDriver, MockNode};
use signup_driver::Locator;
use signup_locator::{LocatorCatalog, Role};
use std::time::Duration;

const FORM_URL: &str = "http://localhost/#/SignUp";

fn setup() -> (LocatorCatalog, TimingConfig, OutcomeConfig) {
    (
        LocatorCatalog::builtin().expect("builtin catalog"),
        TimingConfig::default(),
        OutcomeConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_fill_form_inside_frame() {
    let driver = MockDriver::new(FORM_URL);
    driver.add_frame();
    let name = driver.add(MockNode::new(Scope::Frame(0)).matching(Locator::name("name")));
    let email = driver.add(
        MockNode::new(Scope::Frame(0)).matching(Locator::xpath("//input[@type='email']")),
    );
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);

    assert_eq!(engine.locate_form_scope().await.unwrap(), Some(Scope::Frame(0)));

    let finder = engine.finder();
    let interactor = engine.interactor();
    let located = finder
        .find_visible_across_frames(Role::NameInput, timing.find_per_scope())
        .await
        .unwrap();
    interactor.type_into(&located, "Jane Doe").await.unwrap();
    let located = finder
        .find_visible_across_frames(Role::EmailInput, timing.find_per_scope())
        .await
        .unwrap();
    interactor.type_into(&located, "jane@example.com").await.unwrap();

    assert_eq!(driver.value_of(name), "Jane Doe");
    assert_eq!(driver.value_of(email), "jane@example.com");
    assert_eq!(driver.active_scope(), Scope::Top);
}

#[tokio::test(start_paused = true)]
async fn test_option_texts_are_distinct_and_non_blank() {
    let driver = MockDriver::new(FORM_URL);
    let labels = ["English", " English ", "   ", "Dutch", "Dutch"];
    let mut toggle = MockNode::new(Scope::Top).matching(Locator::css("span.ui-select-toggle"));
    for label in labels {
        let option = driver.add(
            MockNode::new(Scope::Top)
                .matching(Locator::css("div.ui-select-choices-row"))
                .matching(Locator::css("[role='option']"))
                .text(label)
                .hidden(),
        );
        toggle = toggle.on_click(Effect::Show(option));
    }
    driver.add(toggle);
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);

    let texts = engine.dropdown().read_options_in_any_scope().await.unwrap();

    assert_eq!(texts, vec!["English".to_string(), "Dutch".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_choose_language_in_frame() {
    let driver = MockDriver::new(FORM_URL);
    driver.add_frame();
    let option = driver.add(
        MockNode::new(Scope::Frame(0))
            .matching(Locator::css("div.ui-select-choices-row"))
            .text("Dutch")
            .hidden(),
    );
    driver.add(
        MockNode::new(Scope::Frame(0))
            .matching(Locator::css("span.ui-select-toggle"))
            .on_click(Effect::Show(option)),
    );
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);
    let dropdown = engine.dropdown();

    assert_eq!(dropdown.open_and_choose_option("Dutch").await.unwrap(), Choice::NotFound);
    assert_eq!(
        dropdown.choose_in_any_scope("Dutch").await.unwrap(),
        Some(Scope::Frame(0))
    );
    assert_eq!(driver.clicks_on(option), 1);
}

#[tokio::test(start_paused = true)]
async fn test_checkbox_second_call_does_not_click() {
    let driver = MockDriver::new(FORM_URL);
    let checkbox = driver.add(
        MockNode::new(Scope::Top)
            .matching(Locator::css("input[type='checkbox']"))
            .checkbox(false),
    );
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);

    let located = engine
        .finder()
        .find_visible_across_frames(Role::TermsCheckbox, timing.find_per_scope())
        .await
        .unwrap();
    engine.interactor().set_checkbox(&located, true).await.unwrap();
    engine.interactor().set_checkbox(&located, true).await.unwrap();

    assert!(driver.is_checked(checkbox));
    assert_eq!(driver.clicks_on(checkbox), 1);
}

#[tokio::test(start_paused = true)]
async fn test_validation_error_wins_tie_across_scopes() {
    let driver = MockDriver::new(FORM_URL);
    driver.add_frame();
    driver.add(
        MockNode::new(Scope::Frame(0))
            .matching(Locator::css(
                ".help-block, .text-danger, .alert-danger, .validation-message, [data-valmsg-for]",
            ))
            .text("Please enter a valid email"),
    );
    driver.set_body_text(Scope::Top, "A welcome email has been sent. Please check your email.");
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);

    let result = engine.outcome_detector().wait_for_outcome(FORM_URL).await.unwrap();

    assert_eq!(
        result,
        SubmissionOutcome::ValidationError("Please enter a valid email".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_late_navigation_is_success() {
    let driver = MockDriver::new(FORM_URL);
    let trigger = driver.add(
        MockNode::new(Scope::Top)
            .matching(Locator::xpath("//button[@type='submit']"))
            .on_click(Effect::Navigate("http://localhost/#/Welcome".to_string())),
    );
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);

    let located = engine
        .finder()
        .find_visible_across_frames(Role::SubmitButton, timing.find_per_scope())
        .await
        .unwrap();
    engine.interactor().click(&located).await.unwrap();

    let result = engine.outcome_detector().wait_for_outcome(FORM_URL).await.unwrap();
    assert_eq!(result, SubmissionOutcome::Success(SuccessSignal::UrlChanged));
    assert_eq!(driver.clicks_on(trigger), 1);
}

#[tokio::test(start_paused = true)]
async fn test_silent_page_times_out() {
    let driver = MockDriver::new(FORM_URL);
    let (catalog, timing, outcome) = setup();
    let engine = DiscoveryEngine::new(&driver, &catalog, &timing, &outcome);

    let start = tokio::time::Instant::now();
    let result = engine.outcome_detector().wait_for_outcome(FORM_URL).await.unwrap();

    assert_eq!(result, SubmissionOutcome::Timeout);
    assert!(start.elapsed() >= Duration::from_secs(8));
    assert!(!engine
        .outcome_detector()
        .confirmation_shown(timing.find_per_scope())
        .await
        .unwrap());
}
