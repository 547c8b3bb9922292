use serde_json::{json, Value};
use signup_core::BrowserConfig;

/// Chrome arguments applied to every session
const BASE_ARGS: [&str; 3] = ["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];

/// Capabilities sent with `New Session`
#[derive(Debug, Clone)]
pub struct SessionCapabilities {
    pub browser_name: String,
    pub page_load_strategy: String,
    pub args: Vec<String>,
}

impl SessionCapabilities {
    /// Chrome capabilities derived from the browser settings
    pub fn chrome(config: &BrowserConfig) -> Self {
        let mut args: Vec<String> = BASE_ARGS.iter().map(|s| s.to_string()).collect();

        if config.headless {
            args.push("--headless=new".to_string());
            args.push(format!(
                "--window-size={},{}",
                config.window_width, config.window_height
            ));
        } else {
            args.push("--start-maximized".to_string());
        }
        args.extend(config.extra_args.iter().cloned());

        Self {
            browser_name: "chrome".to_string(),
            page_load_strategy: config.page_load_strategy.clone(),
            args,
        }
    }

    /// `capabilities` object of the `New Session` body
    pub fn to_json(&self) -> Value {
        json!({
            "alwaysMatch": {
                "browserName": self.browser_name,
                "pageLoadStrategy": self.page_load_strategy,
                "goog:chromeOptions": { "args": self.args },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_capabilities() {
        let config = BrowserConfig {
            headless: true,
            window_width: 1366,
            window_height: 768,
            ..BrowserConfig::default()
        };
        let caps = SessionCapabilities::chrome(&config);
        assert!(caps.args.contains(&"--headless=new".to_string()));
        assert!(caps.args.contains(&"--window-size=1366,768".to_string()));
        assert!(!caps.args.contains(&"--start-maximized".to_string()));
    }

    #[test]
    fn test_headed_capabilities_json() {
        let mut config = BrowserConfig::default();
        config.extra_args.push("--lang=en".to_string());
        let json = SessionCapabilities::chrome(&config).to_json();

        assert_eq!(json["alwaysMatch"]["pageLoadStrategy"], "eager");
        let args = json["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert_eq!(args[0], "--disable-gpu");
        assert!(args.iter().any(|a| a == "--start-maximized"));
        assert_eq!(args.last().unwrap(), "--lang=en");
    }
}
