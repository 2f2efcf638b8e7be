//! Jellyfin REST client used by the library provider.
//!
//! [`JellyfinClient`] authenticates with an API token, resolves the configured
//! user, and caches the user's library views together with the top-priority
//! TV metadata fetcher of each library. Item queries are issued on demand.

mod types;

pub use types::*;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anibridge_library::{Error, HistoryEntry, ItemQuery, Result};
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::filter::{ids_match, matches_genres, matches_query};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(3);
const USER_AGENT: &str = concat!("anibridge-jellyfin/", env!("CARGO_PKG_VERSION"));

/// Fields requested for every item listing.
const ITEM_FIELDS: &[&str] = &[
    "Path",
    "Genres",
    "SortName",
    "Taglines",
    "DateCreated",
    "DateLastSaved",
    "Overview",
    "ProviderIds",
    "ParentId",
];

/// Server state loaded by [`JellyfinClient::initialize`].
#[derive(Debug, Clone)]
struct Session {
    user_id: String,
    user_name: String,
    sections: Vec<BaseItemDto>,
    series_fetchers: HashMap<String, String>,
}

pub struct JellyfinClient {
    http: Client,
    base_url: String,
    token: String,
    user: String,
    section_filter: HashSet<String>,
    genre_filter: HashSet<String>,
    session: Option<Session>,
}

impl JellyfinClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            http,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            token: config.token.clone(),
            user: config.user.clone(),
            section_filter: config.section_filter(),
            genre_filter: config.genre_filter(),
            session: None,
        }
    }

    /// Resolve the user and load sections and metadata fetcher settings.
    pub async fn initialize(&mut self) -> Result<()> {
        let users: Vec<UserDto> = self.get_json("/Users", &[]).await?;
        let user = resolve_user(&users, &self.user)?;
        let user_id = user.id.clone().unwrap_or_default();
        let user_name = user
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| user_id.clone());

        let views: ItemsResult = self
            .get_json(&format!("/Users/{user_id}/Views"), &[])
            .await?;
        let sections = select_sections(views.items, &self.section_filter);

        let folders: Vec<VirtualFolderInfo> =
            self.get_json("/Library/VirtualFolders", &[]).await?;
        let series_fetchers = series_fetchers_by_section(&folders);

        info!(
            user = %user_name,
            sections = sections.len(),
            fetchers = series_fetchers.len(),
            "Jellyfin session initialized"
        );

        self.session = Some(Session {
            user_id,
            user_name,
            sections,
            series_fetchers,
        });
        Ok(())
    }

    /// Drop all server state.
    pub fn close(&mut self) {
        self.session = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn user_id(&self) -> Result<&str> {
        Ok(&self.session()?.user_id)
    }

    pub fn user_name(&self) -> Result<&str> {
        Ok(&self.session()?.user_name)
    }

    /// Sections visible to the user after filtering; empty before
    /// initialization.
    pub fn sections(&self) -> &[BaseItemDto] {
        self.session
            .as_ref()
            .map(|s| s.sections.as_slice())
            .unwrap_or_default()
    }

    pub fn section(&self, section_id: &str) -> Option<&BaseItemDto> {
        self.sections().iter().find(|s| s.id() == section_id)
    }

    /// The top-priority TV metadata fetcher of a section, if known.
    pub fn show_metadata_fetcher_for_section(&self, section_id: &str) -> Option<&str> {
        self.session
            .as_ref()?
            .series_fetchers
            .get(section_id)
            .map(String::as_str)
    }

    /// Movies or series of a section, with genre and query filters applied.
    pub async fn list_section_items(
        &self,
        section: &BaseItemDto,
        query: &ItemQuery,
    ) -> Result<Vec<BaseItemDto>> {
        let include = if section.collection_type() == "movies" {
            "Movie"
        } else {
            "Series"
        };
        let items = self.list_children(section.id(), include).await?;
        let total = items.len();

        let items: Vec<BaseItemDto> = items
            .into_iter()
            .filter(|item| matches_genres(item, &self.genre_filter))
            .filter(|item| matches_query(item, query))
            .collect();

        debug!(
            section = section.name(),
            total,
            kept = items.len(),
            "Listed Jellyfin section items"
        );
        Ok(items)
    }

    pub async fn list_show_seasons(&self, show_id: &str) -> Result<Vec<BaseItemDto>> {
        self.list_children(show_id, "Season").await
    }

    /// Episodes of a season, or of the whole show when `season_id` is `None`.
    pub async fn list_show_episodes(
        &self,
        show_id: &str,
        season_id: Option<&str>,
    ) -> Result<Vec<BaseItemDto>> {
        self.list_children(season_id.unwrap_or(show_id), "Episode")
            .await
    }

    pub async fn get_item(&self, item_id: &str) -> Result<BaseItemDto> {
        let user_id = self.session()?.user_id.clone();
        self.get_json(&format!("/Items/{item_id}"), &[("userId", user_id)])
            .await
    }

    /// Play history of an item. With `include_episodes` every played episode
    /// beneath the item is reported instead of the item itself.
    pub async fn fetch_history(
        &self,
        item_id: &str,
        include_episodes: bool,
    ) -> Result<Vec<HistoryEntry>> {
        if item_id.is_empty() {
            return Ok(Vec::new());
        }

        let played: Vec<BaseItemDto> = if include_episodes {
            self.list_children(item_id, "Episode").await?
        } else {
            vec![self.get_item(item_id).await?]
        };

        Ok(played
            .iter()
            .filter(|episode| !episode.id().is_empty())
            .filter_map(|episode| {
                episode.last_played().map(|viewed_at| HistoryEntry {
                    library_key: episode.id().to_string(),
                    viewed_at,
                })
            })
            .collect())
    }

    /// Partially watched and not finished.
    pub fn is_on_continue_watching(item: &BaseItemDto) -> bool {
        match &item.user_data {
            Some(data) if data.played => false,
            Some(data) => data.playback_position_ticks.unwrap_or(0) > 0,
            None => false,
        }
    }

    /// Favorites double as the watchlist.
    pub fn is_on_watchlist(item: &BaseItemDto) -> bool {
        item.user_data.as_ref().is_some_and(|d| d.is_favorite)
    }

    pub fn build_image_url(
        &self,
        item_id: &str,
        image_type: &str,
        tag: Option<&str>,
    ) -> Result<String> {
        let raw = format!("{}/Items/{item_id}/Images/{image_type}", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("invalid image url '{raw}': {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("maxHeight", "400")
                .append_pair("maxWidth", "300")
                .append_pair("quality", "90")
                .append_pair("api_key", &self.token);
            if let Some(tag) = tag {
                query.append_pair("tag", tag);
            }
        }
        Ok(url.into())
    }

    /// Link to the item's page in the Jellyfin web client.
    pub fn build_item_url(&self, item_id: &str) -> String {
        format!("{}/web/#/details?id={item_id}", self.base_url)
    }

    /// Download an image, returning its content type and bytes.
    pub async fn fetch_image(&self, url: &str) -> Result<(String, Bytes)> {
        let response = self
            .http
            .get(url)
            .header("X-Emby-Token", &self.token)
            .timeout(IMAGE_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::http("image", e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let body = response.bytes().await.map_err(|e| Error::http("image", e))?;
        Ok((content_type, body))
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NotInitialized)
    }

    async fn list_children(&self, parent_id: &str, item_type: &str) -> Result<Vec<BaseItemDto>> {
        let user_id = self.session()?.user_id.clone();
        let query = [
            ("userId", user_id),
            ("parentId", parent_id.to_string()),
            ("includeItemTypes", item_type.to_string()),
            ("recursive", "true".to_string()),
            ("fields", ITEM_FIELDS.join(",")),
            ("enableUserData", "true".to_string()),
            ("enableImages", "true".to_string()),
        ];
        let result: ItemsResult = self.get_json("/Items", &query).await?;
        Ok(result.items)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, "Jellyfin GET");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("MediaBrowser Token=\"{}\"", self.token))
            .query(query)
            .send()
            .await
            .map_err(|e| Error::http(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body,
            });
        }

        response.json().await.map_err(|e| Error::http(endpoint, e))
    }
}

/// Find the configured user by id or name, case-insensitively.
pub fn resolve_user<'a>(users: &'a [UserDto], target: &str) -> Result<&'a UserDto> {
    let target = target.trim();
    if target.is_empty() {
        return Err(Error::Config(
            "Jellyfin provider requires a non-empty user value".into(),
        ));
    }

    users
        .iter()
        .find(|user| {
            user.id.as_deref().is_some_and(|id| ids_match(id, target))
                || user
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase() == target.to_lowercase())
        })
        .ok_or_else(|| Error::not_found("Jellyfin user", target))
}

/// Keep movie and TV views, restricted to the filter when it is non-empty.
pub fn select_sections(views: Vec<BaseItemDto>, filter: &HashSet<String>) -> Vec<BaseItemDto> {
    views
        .into_iter()
        .filter(|view| matches!(view.collection_type().as_str(), "movies" | "tvshows"))
        .filter(|view| filter.is_empty() || filter.contains(&view.name().to_lowercase()))
        .collect()
}

/// Map each TV library id to its top-priority series metadata fetcher.
pub fn series_fetchers_by_section(folders: &[VirtualFolderInfo]) -> HashMap<String, String> {
    folders
        .iter()
        .filter(|f| {
            f.collection_type
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("tvshows"))
        })
        .filter_map(|f| {
            let section_id = f.item_id.as_deref().filter(|id| !id.is_empty())?;
            top_series_fetcher(f).map(|fetcher| (section_id.to_string(), fetcher))
        })
        .collect()
}

/// The first fetcher in priority order that is also enabled.
///
/// Falls back to the first enabled fetcher when no order is configured, and
/// to the first ordered fetcher when the enabled set is not reported.
pub fn top_series_fetcher(folder: &VirtualFolderInfo) -> Option<String> {
    let options = folder.library_options.as_ref()?.type_options.as_ref()?;

    options
        .iter()
        .filter(|o| o.item_type.as_deref() == Some("Series"))
        .find_map(|option| {
            let order = non_empty(option.metadata_fetcher_order.as_deref());
            let enabled = option.metadata_fetchers.as_deref();

            let candidate = match (order, enabled) {
                (Some(order), Some(enabled)) => order
                    .iter()
                    .find(|name| enabled.iter().any(|e| e.eq_ignore_ascii_case(name))),
                (None, Some(enabled)) => enabled.first(),
                (Some(order), None) => order.first(),
                (None, None) => None,
            };
            candidate.filter(|name| !name.is_empty()).cloned()
        })
}

fn non_empty(values: Option<&[String]>) -> Option<&[String]> {
    values.filter(|v| !v.is_empty())
}
