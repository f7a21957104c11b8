//! HTNA configuration

use htna_dom::ShadowRootMode;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Context-wide options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Shadow root mode for components that do not set one
    #[serde(with = "mode_keyword")]
    pub default_mode: ShadowRootMode,

    /// Wrapper tag for slot content
    pub default_slot_wrapper: String,

    /// Class of style nodes owned by the component
    pub scoped_style_class: String,

    /// Prefix of rich-data tokens
    pub rich_token_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_mode: ShadowRootMode::Closed,
            default_slot_wrapper: "div".to_string(),
            scoped_style_class: "htna-scoped-style".to_string(),
            rich_token_prefix: "$id".to_string(),
        }
    }
}

impl Options {
    /// Load options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `"open"` / `"closed"` keywords
mod mode_keyword {
    use htna_dom::ShadowRootMode;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mode: &ShadowRootMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(mode.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ShadowRootMode, D::Error> {
        let keyword = String::deserialize(deserializer)?;
        ShadowRootMode::parse(&keyword)
            .ok_or_else(|| de::Error::custom(format!("unknown shadow root mode: {keyword}")))
    }
}
