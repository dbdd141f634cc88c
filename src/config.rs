use std::path::Path;

use serde::Deserialize;

use crate::GateError;
use crate::core::Result;

/// Build-output folder names probed by the resolver, besides the namespace root itself.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Layout {
    /// Nested folder a build may boot from (`{namespace}/{secondary}/index.html`).
    pub secondary: String,
    /// Alternate output folder, only probed for the root document.
    pub alternate: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            secondary: "start".to_string(),
            alternate: "build".to_string(),
        }
    }
}

/// Static gateway settings, usually read from a TOML file.
///
/// ```toml
/// asset_max_age = 86400
/// storage_url = "https://storage.example/builds"
///
/// [layout]
/// secondary = "start"
/// alternate = "build"
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    pub layout: Layout,
    /// `max-age` for the public cache directive on non-markup assets, in seconds.
    pub asset_max_age: u32,
    /// Initial backing-store base; later control messages overwrite it.
    pub storage_url: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            asset_max_age: 3600,
            storage_url: None,
        }
    }
}

impl GateConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GateError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GateError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn with_storage_url(mut self, url: &str) -> Self {
        self.storage_url = Some(url.to_string());
        self
    }
}
