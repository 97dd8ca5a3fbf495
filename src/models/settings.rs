use serde::{ Deserialize, Serialize };
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::llm::ProviderId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(format!("Unsupported theme: {}", s)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };
        f.write_str(name)
    }
}

fn default_font_size() -> String {
    "medium".to_string()
}

fn default_provider() -> ProviderId {
    ProviderId::Claude
}

/// Process-wide preferences, persisted as one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_font_size")]
    pub font_size: String,
    #[serde(default = "default_provider")]
    pub provider: ProviderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: default_font_size(),
            provider: default_provider(),
            model: None,
        }
    }
}

impl Settings {
    pub fn effective_model(&self) -> String {
        match self.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => model.to_string(),
            _ => self.provider.default_model().to_string(),
        }
    }
}

/// Provider API keys. Opaque strings; blank counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        self.keys
            .get(&provider)
            .map(String::as_str)
            .filter(|k| !k.trim().is_empty())
    }

    pub fn set(&mut self, provider: ProviderId, key: impl Into<String>) {
        let key = key.into();
        if key.trim().is_empty() {
            self.keys.remove(&provider);
        } else {
            self.keys.insert(provider, key);
        }
    }

    pub fn configured(&self) -> Vec<ProviderId> {
        self.keys
            .iter()
            .filter(|(_, k)| !k.trim().is_empty())
            .map(|(p, _)| *p)
            .collect()
    }
}
