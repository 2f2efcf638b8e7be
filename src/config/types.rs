use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Host configuration document. Only the Jellyfin block is read.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub library_provider_config: LibraryProviderConfigs,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibraryProviderConfigs {
    #[serde(default)]
    pub jellyfin: Option<ProviderConfig>,
}

/// Settings for the Jellyfin library provider
/// (`library_provider_config.jellyfin`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Base address of the Jellyfin server
    #[serde(default, deserialize_with = "nullable_string")]
    pub url: String,

    /// API token
    #[serde(default, deserialize_with = "nullable_string")]
    pub token: String,

    /// User id, username or display name
    #[serde(default, deserialize_with = "nullable_string")]
    pub user: String,

    /// Library section names to include (empty = all sections)
    #[serde(default, deserialize_with = "nullable_list")]
    pub sections: Vec<String>,

    /// Genres to include (empty = all genres)
    #[serde(default, deserialize_with = "nullable_list")]
    pub genres: Vec<String>,

    /// Restrict show/season/episode matching to the section's top-priority
    /// metadata downloader (default: true)
    #[serde(default = "default_strict", deserialize_with = "nullable_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

/// A `null` string is treated as empty so `validate` reports it.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A `null` strict flag falls back to the default.
fn nullable_strict<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_strict))
}

/// Accept `null` wherever a list is expected and treat it as empty.
fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProviderConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            user: user.into(),
            sections: Vec::new(),
            genres: Vec::new(),
            strict: default_strict(),
        }
    }

    /// Lower-cased section names; empty means every section matches.
    pub fn section_filter(&self) -> HashSet<String> {
        lowercase_set(&self.sections)
    }

    /// Lower-cased genre names; empty means every genre matches.
    pub fn genre_filter(&self) -> HashSet<String> {
        lowercase_set(&self.genres)
    }
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
