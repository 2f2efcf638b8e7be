mod types;

pub use types::*;

use std::path::Path;

use anibridge_library::{Error, Result};

const REQUIRED_FIELDS_MESSAGE: &str =
    "The Jellyfin provider requires 'url', 'token', and 'user' configuration values";

impl ProviderConfig {
    /// Build the configuration from the host's configuration object.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: ProviderConfig = serde_json::from_value(value)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read the `[library_provider_config.jellyfin]` table of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let host: HostConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))?;
        let config = host
            .library_provider_config
            .jellyfin
            .ok_or_else(|| Error::Config("missing [library_provider_config.jellyfin]".into()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and the server address.
    pub fn validate(&self) -> Result<()> {
        if [&self.url, &self.token, &self.user]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(Error::Config(REQUIRED_FIELDS_MESSAGE.into()));
        }

        reqwest::Url::parse(self.url.trim())
            .map_err(|e| Error::Config(format!("invalid url '{}': {e}", self.url)))?;

        Ok(())
    }
}

/// Load the provider configuration from a TOML file
pub fn load_config(path: &Path) -> Result<ProviderConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {e}", path)))?;

    ProviderConfig::from_toml_str(&content)
}

/// Load config from the given path or the first default location that exists
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<ProviderConfig> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./anibridge.toml",
        "./config.toml",
        "~/.config/anibridge/config.toml",
        "/etc/anibridge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Err(Error::Config(format!(
        "no config file found (searched {})",
        default_paths.join(", ")
    )))
}
