use crate::capabilities::SessionCapabilities;
use crate::driver::{Driver, ElementRef, Rect};
use crate::error::{DriverError, Result};
use crate::locator::Locator;
use base64::Engine as _;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, info, trace, warn};

/// A live session on a W3C WebDriver server (chromedriver, geckodriver, ...).
pub struct WebDriverSession {
    client: Client,
    base: String,
    session_id: String,
}

impl WebDriverSession {
    /// Open a new browser session on the server at `server_url`.
    pub async fn connect(server_url: &str, capabilities: &SessionCapabilities) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        let base = server_url.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{base}/session"))
            .json(&json!({ "capabilities": capabilities.to_json() }))
            .send()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        let value = unwrap_response(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol("New Session reply has no sessionId".into()))?
            .to_string();

        info!(session_id = %session_id, server = %base, "WebDriver session started");

        Ok(Self {
            client,
            base,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// End the session and close the browser.
    pub async fn close(self) -> Result<()> {
        let url = format!("{}/session/{}", self.base, self.session_id);
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        unwrap_response(response).await?;
        info!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.base, self.session_id, path);
        trace!(%method, path, "webdriver command");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        unwrap_response(response).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.command(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn element_bool(&self, element: &ElementRef, property: &str) -> Result<bool> {
        let value = self
            .get(&format!("/element/{}/{property}", element.id()))
            .await?;
        value
            .as_bool()
            .ok_or_else(|| DriverError::Protocol(format!("{property} is not a boolean")))
    }
}

/// Extract `value` from a reply, turning W3C error payloads into [`DriverError`].
async fn unwrap_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| DriverError::Protocol(format!("unreadable reply ({status}): {e}")))?;
    parse_reply(status.is_success(), body)
}

fn parse_reply(success: bool, mut body: Value) -> Result<Value> {
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);
    if success {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    debug!(error, message, "webdriver error reply");
    Err(DriverError::from_w3c(error, message))
}

fn parse_elements(value: &Value) -> Result<Vec<ElementRef>> {
    let items = value
        .as_array()
        .ok_or_else(|| DriverError::Protocol("Find Elements reply is not an array".into()))?;
    items
        .iter()
        .map(|item| {
            ElementRef::from_value(item)
                .ok_or_else(|| DriverError::Protocol(format!("not an element reference: {item}")))
        })
        .collect()
}

#[async_trait::async_trait]
impl Driver for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.post("/url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.get("/url").await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol("URL is not a string".into()))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let value = self
            .post(
                "/elements",
                json!({ "using": locator.using.as_w3c(), "value": locator.value }),
            )
            .await?;
        parse_elements(&value)
    }

    async fn find_all_within(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>> {
        let value = self
            .post(
                &format!("/element/{}/elements", parent.id()),
                json!({ "using": locator.using.as_w3c(), "value": locator.value }),
            )
            .await?;
        parse_elements(&value)
    }

    async fn switch_to_top(&self) -> Result<()> {
        self.post("/frame", json!({ "id": null })).await?;
        Ok(())
    }

    async fn switch_to_frame(&self, index: usize) -> Result<()> {
        self.post("/frame", json!({ "id": index })).await?;
        Ok(())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.element_bool(element, "displayed").await
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.element_bool(element, "enabled").await
    }

    async fn is_selected(&self, element: &ElementRef) -> Result<bool> {
        self.element_bool(element, "selected").await
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        let value = self.get(&format!("/element/{}/text", element.id())).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn rect(&self, element: &ElementRef) -> Result<Rect> {
        let value = self.get(&format!("/element/{}/rect", element.id())).await?;
        serde_json::from_value(value).map_err(|e| DriverError::Protocol(e.to_string()))
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.post(&format!("/element/{}/click", element.id()), json!({}))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.post(&format!("/element/{}/clear", element.id()), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.post(
            &format!("/element/{}/value", element.id()),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn click_at_offset(&self, element: &ElementRef, x: i64, y: i64) -> Result<()> {
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [
                    { "type": "pointerMove", "duration": 0, "origin": element.to_arg(), "x": x, "y": y },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pointerUp", "button": 0 }
                ]
            }]
        });
        let result = self.post("/actions", actions).await;

        if let Err(e) = self.command(Method::DELETE, "/actions", None).await {
            warn!(error = %e, "failed to release input state");
        }
        result.map(|_| ())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.get("/screenshot").await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| DriverError::Protocol("screenshot is not a string".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| DriverError::Protocol(format!("screenshot decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_success() {
        let value = parse_reply(true, json!({ "value": { "sessionId": "s1" } })).unwrap();
        assert_eq!(value["sessionId"], "s1");
    }

    #[test]
    fn test_parse_reply_null_value() {
        assert_eq!(parse_reply(true, json!({ "value": null })).unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_reply_error() {
        let body = json!({
            "value": {
                "error": "stale element reference",
                "message": "element is not attached to the page document",
                "stacktrace": ""
            }
        });
        let err = parse_reply(false, body).unwrap_err();
        assert!(matches!(err, DriverError::StaleElement(_)));
    }

    #[test]
    fn test_parse_reply_error_without_payload() {
        let err = parse_reply(false, json!({})).unwrap_err();
        assert!(matches!(err, DriverError::WebDriver { .. }));
    }

    #[test]
    fn test_parse_elements() {
        let value = json!([
            { "element-6066-11e4-a52e-4f735466cecf": "a" },
            { "element-6066-11e4-a52e-4f735466cecf": "b" }
        ]);
        let elements = parse_elements(&value).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].id(), "b");

        assert!(parse_elements(&json!([{ "id": "a" }])).is_err());
        assert!(parse_elements(&json!({})).is_err());
    }
}
