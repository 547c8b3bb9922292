use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no such element: {0}")]
    NoSuchElement(String),

    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("element click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("invalid element state: {0}")]
    InvalidElementState(String),

    #[error("no such frame: {0}")]
    NoSuchFrame(String),

    #[error("javascript error: {0}")]
    Javascript(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("webdriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Map a W3C WebDriver error code to a variant.
    pub fn from_w3c(error: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match error {
            "no such element" => Self::NoSuchElement(message),
            "stale element reference" => Self::StaleElement(message),
            "element click intercepted" => Self::ClickIntercepted(message),
            "element not interactable" => Self::NotInteractable(message),
            "invalid element state" => Self::InvalidElementState(message),
            "no such frame" => Self::NoSuchFrame(message),
            "javascript error" => Self::Javascript(message),
            "timeout" | "script timeout" => Self::Timeout(message),
            "invalid session id" | "session not created" => Self::Session(message),
            other => Self::WebDriver {
                error: other.to_string(),
                message,
            },
        }
    }

    /// The handle no longer points at a node in the current document.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement(_) | Self::NoSuchElement(_))
    }

    /// The session itself is unusable; polling loops must not swallow these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Session(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DriverError::StaleElement("element detached".to_string());
        assert_eq!(err.to_string(), "stale element reference: element detached");
    }

    #[test]
    fn test_from_w3c_codes() {
        assert!(matches!(
            DriverError::from_w3c("element click intercepted", "overlay"),
            DriverError::ClickIntercepted(_)
        ));
        assert!(matches!(
            DriverError::from_w3c("script timeout", "slow"),
            DriverError::Timeout(_)
        ));
        let err = DriverError::from_w3c("unknown command", "nope");
        assert!(err.to_string().contains("unknown command"));
    }

    #[test]
    fn test_classification() {
        assert!(DriverError::StaleElement(String::new()).is_stale());
        assert!(DriverError::NoSuchElement(String::new()).is_stale());
        assert!(!DriverError::ClickIntercepted(String::new()).is_fatal());
        assert!(DriverError::Transport(String::new()).is_fatal());
        assert!(DriverError::Session(String::new()).is_fatal());
        assert!(!DriverError::NoSuchFrame(String::new()).is_fatal());
    }
}
