use serde::{Deserialize, Serialize};
use std::fmt;

/// W3C WebDriver location strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Using {
    Css,
    XPath,
    TagName,
    LinkText,
}

impl Using {
    /// Wire name used in `Find Elements` requests.
    pub fn as_w3c(self) -> &'static str {
        match self {
            Self::Css => "css selector",
            Self::XPath => "xpath",
            Self::TagName => "tag name",
            Self::LinkText => "link text",
        }
    }
}

/// A query the driver evaluates against the current scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub using: Using,
    pub value: String,
}

impl Locator {
    pub fn new(using: Using, value: impl Into<String>) -> Self {
        Self {
            using,
            value: value.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Using::Css, selector)
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(Using::XPath, expr)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(Using::TagName, name)
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Using::LinkText, text)
    }

    /// W3C has no `name` strategy; it is expressed as an attribute selector.
    pub fn name(name: &str) -> Self {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        Self::css(format!("[name=\"{escaped}\"]"))
    }

    /// Elements whose own text, whitespace-normalized, equals `text`.
    pub fn exact_text(text: &str) -> Self {
        Self::xpath(format!("//*[normalize-space(text())={}]", xpath_literal(text)))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.using.as_w3c(), self.value)
    }
}

/// Quote a string for use inside an XPath expression.
///
/// XPath 1.0 has no escape sequences, so values holding both quote kinds are
/// split with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_locator_is_css() {
        let locator = Locator::name("orgName");
        assert_eq!(locator.using, Using::Css);
        assert_eq!(locator.value, "[name=\"orgName\"]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::tag("option").to_string(), "tag name=option");
        assert_eq!(
            Locator::css("span.ui-select-toggle").to_string(),
            "css selector=span.ui-select-toggle"
        );
    }

    #[test]
    fn test_xpath_literal() {
        assert_eq!(xpath_literal("English"), "'English'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')"
        );
    }

    #[test]
    fn test_exact_text() {
        let locator = Locator::exact_text("Dutch");
        assert_eq!(locator.value, "//*[normalize-space(text())='Dutch']");
    }
}
