//! Jellyfin API response types.
//!
//! Only the fields the provider reads are modelled. Every field is optional
//! because Jellyfin omits nulls depending on the requested `fields`.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserDto {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Wrapper returned by list endpoints (`/Items`, `/Users/{id}/Views`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemsResult {
    pub items: Vec<BaseItemDto>,
    pub total_record_count: Option<u64>,
}

/// The main item type returned by Jellyfin APIs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BaseItemDto {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub collection_type: Option<String>,
    pub path: Option<String>,
    pub sort_name: Option<String>,
    pub overview: Option<String>,
    pub genres: Option<Vec<String>>,
    pub provider_ids: Option<HashMap<String, Option<String>>>,
    pub user_data: Option<UserItemDataDto>,
    #[serde(deserialize_with = "jellyfin_datetime")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "jellyfin_datetime")]
    pub date_last_saved: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "jellyfin_datetime")]
    pub date_last_media_added: Option<DateTime<Utc>>,
    pub image_tags: Option<HashMap<String, String>>,
    pub parent_id: Option<String>,
    pub series_id: Option<String>,
    pub season_id: Option<String>,
    pub index_number: Option<i32>,
    pub parent_index_number: Option<i32>,
}

impl BaseItemDto {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn item_type(&self) -> &str {
        self.item_type.as_deref().unwrap_or_default()
    }

    /// Lower-cased collection type, empty if absent.
    pub fn collection_type(&self) -> String {
        self.collection_type
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// When media was last added under this item, or its creation date.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.date_last_media_added.or(self.date_created)
    }

    pub fn last_played(&self) -> Option<DateTime<Utc>> {
        self.user_data.as_ref().and_then(|u| u.last_played_date)
    }

    /// Tag of the primary image, accepting either key casing.
    pub fn primary_image_tag(&self) -> Option<&str> {
        let tags = self.image_tags.as_ref()?;
        tags.get("Primary")
            .or_else(|| tags.get("primary"))
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserItemDataDto {
    pub played: bool,
    pub play_count: Option<i64>,
    /// 0.0 - 10.0
    pub rating: Option<f64>,
    pub is_favorite: bool,
    pub playback_position_ticks: Option<i64>,
    #[serde(deserialize_with = "jellyfin_datetime")]
    pub last_played_date: Option<DateTime<Utc>>,
}

/// Entry of `/Library/VirtualFolders`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VirtualFolderInfo {
    pub name: Option<String>,
    pub item_id: Option<String>,
    pub collection_type: Option<String>,
    pub library_options: Option<LibraryOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LibraryOptions {
    pub type_options: Option<Vec<TypeOptions>>,
}

/// Per item-type metadata settings of a library.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TypeOptions {
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    /// Enabled fetchers.
    pub metadata_fetchers: Option<Vec<String>>,
    /// Priority order of fetchers, highest first.
    pub metadata_fetcher_order: Option<Vec<String>>,
}

/// Parse a Jellyfin timestamp. Values without an offset are read as local
/// time.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn jellyfin_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}
