use crate::error::{DriverError, Result};
use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Key under which W3C WebDriver serializes element references.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Transient reference to a located node.
///
/// Valid only in the scope it was found in and until the DOM changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Script argument form (`arguments[n]` resolves to the node).
    pub fn to_arg(&self) -> Value {
        json!({ W3C_ELEMENT_KEY: self.id })
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .get(W3C_ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(Self::new)
    }
}

/// Element position and size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// W3C WebDriver key codepoints.
pub mod keys {
    pub const NULL: &str = "\u{E000}";
    pub const CONTROL: &str = "\u{E009}";
    pub const ESCAPE: &str = "\u{E00C}";
    pub const DELETE: &str = "\u{E017}";

    /// Ctrl+A followed by a modifier release.
    pub fn select_all() -> String {
        format!("{CONTROL}a{NULL}")
    }
}

/// Browser capabilities the discovery engine relies on.
///
/// All element queries run against the current scope (top document or the
/// frame last switched to).
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the top-level browsing context
    async fn current_url(&self) -> Result<String>;

    /// Run a synchronous script in the current scope and return its value
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    /// All elements matching `locator` in the current scope
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>>;

    /// All descendants of `parent` matching `locator`
    async fn find_all_within(&self, parent: &ElementRef, locator: &Locator)
        -> Result<Vec<ElementRef>>;

    /// Make the top-level document the current scope
    async fn switch_to_top(&self) -> Result<()>;

    /// Enter the frame at `index` of the current scope
    async fn switch_to_frame(&self, index: usize) -> Result<()>;

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool>;

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool>;

    async fn is_selected(&self, element: &ElementRef) -> Result<bool>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementRef) -> Result<String>;

    async fn rect(&self, element: &ElementRef) -> Result<Rect>;

    /// Native click
    async fn click(&self, element: &ElementRef) -> Result<()>;

    /// Clear an editable element
    async fn clear(&self, element: &ElementRef) -> Result<()>;

    /// Type text (may contain codepoints from [`keys`])
    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()>;

    /// Pointer click at an offset from the element's center
    async fn click_at_offset(&self, element: &ElementRef, x: i64, y: i64) -> Result<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

/// Helper to extract the host from a URL, for logging
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| DriverError::Protocol(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| DriverError::Protocol("No host in URL".to_string()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("http://jt-dev.azurewebsites.net/#/SignUp").unwrap(),
            "jt-dev.azurewebsites.net"
        );
        assert_eq!(
            extract_domain("http://subdomain.example.com:8080/path").unwrap(),
            "subdomain.example.com"
        );
    }

    #[test]
    fn test_extract_domain_invalid() {
        assert!(extract_domain("not-a-url").is_err());
    }

    #[test]
    fn test_element_ref_wire_shape() {
        let element = ElementRef::new("abc-123");
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value, element.to_arg());
        assert_eq!(ElementRef::from_value(&value), Some(element));
        assert_eq!(ElementRef::from_value(&json!({"id": "x"})), None);
    }

    #[test]
    fn test_select_all_chord() {
        assert_eq!(keys::select_all(), "\u{E009}a\u{E000}");
    }
}
