//! Shared types used across the sign-up checker.

use crate::error::SignupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document context that element queries are evaluated against.
///
/// `Top` is the top-level document; `Frame(i)` is the i-th `iframe`/`frame`
/// of the top document, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Top-level document
    Top,
    /// Embedded frame at the given index within the top document
    Frame(usize),
}

impl Scope {
    /// Frame index, or `None` for the top document.
    #[must_use]
    pub const fn frame_index(self) -> Option<usize> {
        match self {
            Self::Top => None,
            Self::Frame(index) => Some(index),
        }
    }

    /// Whether this is the top-level document.
    #[must_use]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::Top)
    }

    /// All scopes of a page with `frame_count` frames: top first, then frames in order.
    pub fn all(frame_count: usize) -> impl Iterator<Item = Scope> {
        std::iter::once(Self::Top).chain((0..frame_count).map(Self::Frame))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Frame(index) => write!(f, "frame[{index}]"),
        }
    }
}

/// Free-text inputs of the sign-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Full name input
    Name,
    /// Organization name input
    Organization,
    /// Email address input
    Email,
}

impl FieldRole {
    /// All text field roles in form order.
    pub const ALL: [FieldRole; 3] = [Self::Name, Self::Organization, Self::Email];

    /// Short lowercase label used in logs and step names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Organization => "organization",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldRole {
    type Err = SignupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "org" | "organization" | "organisation" => Ok(Self::Organization),
            "email" | "e-mail" => Ok(Self::Email),
            other => Err(SignupError::Validation(format!(
                "unknown field role '{other}', expected name, organization or email"
            ))),
        }
    }
}
