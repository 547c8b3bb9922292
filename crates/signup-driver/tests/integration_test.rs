use signup_core::BrowserConfig;
use signup_driver::{Driver, Locator, SessionCapabilities, WebDriverSession};

const SERVER: &str = "http://localhost:9515";

fn headless() -> SessionCapabilities {
    SessionCapabilities::chrome(&BrowserConfig {
        headless: true,
        ..BrowserConfig::default()
    })
}

#[tokio::test]
#[ignore] // Requires chromedriver listening on :9515
async fn test_session_lifecycle() {
    let session = WebDriverSession::connect(SERVER, &headless()).await;
    assert!(session.is_ok(), "Failed to create WebDriver session");
    session.unwrap().close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires chromedriver listening on :9515
async fn test_navigation_and_query() {
    let session = WebDriverSession::connect(SERVER, &headless()).await.unwrap();

    session
        .navigate("data:text/html,<p id='x'>hello</p>")
        .await
        .unwrap();
    let found = session.find_all(&Locator::css("#x")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(session.text(&found[0]).await.unwrap(), "hello");

    // Top document has no frames to enter
    assert!(session.switch_to_frame(0).await.is_err());

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_refused() {
    // Nothing listens on port 9; the transport error surfaces instead of a panic
    let result = WebDriverSession::connect("http://127.0.0.1:9", &headless()).await;
    assert!(result.is_err());
}
