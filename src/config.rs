// Editor configuration: optional overrides on top of workable defaults.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::document::SanitizePolicy;

/// Actions the toolbar carries when the embedder doesn't choose their own.
pub const DEFAULT_ACTIONS: &[&str] = &[
    "blockquote",
    "h2",
    "h3",
    "p",
    "code",
    "insertorderedlist",
    "insertunorderedlist",
    "inserthorizontalrule",
    "indent",
    "outdent",
    "bold",
    "italic",
    "underline",
    "createlink",
];

const DEFAULT_CLASS: &str = "nib";
const DEFAULT_STAY_MSG: &str = "Are you going to leave here?";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor target selector {0:?} (expected \"#some-id\")")]
    InvalidSelector(String),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// What an embedder may override. Everything is optional; the resolved
/// config fills in the rest.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    /// Selector the container element must match, e.g. `#editor`.
    pub selector: Option<String>,
    pub class: Option<String>,
    pub debug: Option<bool>,
    pub stay: Option<bool>,
    pub stay_msg: Option<String>,
    pub placeholder: Option<String>,
    /// Toolbar actions, in display order.
    pub list: Option<Vec<String>>,
    pub clean_attrs: Option<Vec<String>>,
    pub clean_tags: Option<Vec<String>>,
    pub link_input_keeps_menu: Option<bool>,
}

impl ConfigOverrides {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Merge the overrides with defaults into a complete configuration.
    pub fn resolve(self) -> Result<EditorConfig, ConfigError> {
        if let Some(selector) = &self.selector
            && !SELECTOR.is_match(selector)
        {
            return Err(ConfigError::InvalidSelector(selector.clone()));
        }
        let debug = self.debug.unwrap_or(false);
        let mut policy = SanitizePolicy::default();
        if let Some(attrs) = self.clean_attrs {
            policy.attrs = attrs;
        }
        if let Some(tags) = self.clean_tags {
            policy.tags = tags;
        }
        Ok(EditorConfig {
            selector: self.selector,
            class: self.class.unwrap_or_else(|| DEFAULT_CLASS.to_string()),
            debug,
            // Debug builds shouldn't nag about leaving the page.
            stay: self.stay.unwrap_or(!debug),
            stay_msg: self
                .stay_msg
                .unwrap_or_else(|| DEFAULT_STAY_MSG.to_string()),
            placeholder: self.placeholder,
            actions: self
                .list
                .unwrap_or_else(|| DEFAULT_ACTIONS.iter().map(|s| s.to_string()).collect()),
            policy,
            link_input_keeps_menu: self.link_input_keeps_menu.unwrap_or(true),
        })
    }
}

static SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\S+$").expect("selector pattern"));

/// Fully-resolved editor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub selector: Option<String>,
    pub class: String,
    pub debug: bool,
    pub stay: bool,
    pub stay_msg: String,
    pub placeholder: Option<String>,
    pub actions: Vec<String>,
    pub policy: SanitizePolicy,
    pub link_input_keeps_menu: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        ConfigOverrides::default()
            .resolve()
            .expect("defaults always resolve")
    }
}
