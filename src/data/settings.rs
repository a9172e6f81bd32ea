use crate::data::persistence::Persistable;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// Label printed in chart table headers.
    pub company: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            company: "Burnup".to_string(),
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml. Other readers of
/// the same file work independently because serde ignores unknown fields by
/// default.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl AppSettings {
    pub fn load() -> Result<Self> {
        Ok(SettingsWrapper::load()?.settings)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let wrapper = SettingsWrapper {
            settings: self.clone(),
        };
        Persistable::save_to(&wrapper, dir)
    }
}
