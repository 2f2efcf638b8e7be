//! The Jellyfin implementation of [`LibraryProvider`].

use std::collections::{BTreeMap, HashMap};

use anibridge_library::{
    Error, HistoryEntry, ItemQuery, LibraryEntry, LibraryProvider, LibrarySection, LibraryUser,
    MappingDescriptor, MediaKind, Result, WebhookOutcome, WebhookRequest,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::client::{BaseItemDto, JellyfinClient};
use crate::config::ProviderConfig;
use crate::filter::ids_match;
use crate::mapping;
use crate::webhook::JellyfinWebhook;

pub const NAMESPACE: &str = "jellyfin";

/// Webhook events that require a synchronization.
const SYNC_EVENTS: &[&str] = &["ItemAdded", "PlaybackStop", "UserDataSaved"];

pub struct JellyfinLibraryProvider {
    config: ProviderConfig,
    client: JellyfinClient,
    user: Option<LibraryUser>,
    sections: Vec<LibrarySection>,
    /// Show section id -> provider allowed under strict matching.
    strict_providers: HashMap<String, &'static str>,
    /// Parent shows and seasons fetched while building descriptors.
    parents: Mutex<HashMap<String, BaseItemDto>>,
}

impl JellyfinLibraryProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = JellyfinClient::new(&config);
        Ok(Self {
            config,
            client,
            user: None,
            sections: Vec::new(),
            strict_providers: HashMap::new(),
            parents: Mutex::new(HashMap::new()),
        })
    }

    /// Build a provider from the host's configuration object.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Self::new(ProviderConfig::from_value(value)?)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn client(&self) -> &JellyfinClient {
        &self.client
    }

    /// Look up one of this provider's sections by key.
    pub fn section(&self, key: &str) -> Result<&LibrarySection> {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| Error::not_found("section", key))
    }

    fn build_strict_providers(&self) -> HashMap<String, &'static str> {
        if !self.config.strict {
            return HashMap::new();
        }

        self.sections
            .iter()
            .filter(|s| s.kind == MediaKind::Show)
            .filter_map(|section| {
                let Some(fetcher) = self.client.show_metadata_fetcher_for_section(&section.key)
                else {
                    warn!(
                        section = %section.title,
                        "No series metadata fetcher configured; shows will not be matched"
                    );
                    return None;
                };
                match mapping::strict_provider_for_fetcher(fetcher) {
                    Some(provider) => Some((section.key.clone(), provider)),
                    None => {
                        warn!(
                            section = %section.title,
                            fetcher,
                            "Unsupported series metadata fetcher; shows will not be matched"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Fetch a parent item, memoized until [`LibraryProvider::clear_cache`].
    async fn parent_item(&self, item_id: &str) -> Result<BaseItemDto> {
        let cached = self.parents.lock().get(item_id).cloned();
        if let Some(item) = cached {
            return Ok(item);
        }

        let item = self.client.get_item(item_id).await?;
        self.parents
            .lock()
            .insert(item_id.to_string(), item.clone());
        Ok(item)
    }

    async fn show_descriptors_for(
        &self,
        show_id: &str,
        section_key: &str,
    ) -> Result<Vec<MappingDescriptor>> {
        let show = self.parent_item(show_id).await?;
        Ok(self.show_descriptors(&provider_ids(&show), section_key))
    }

    fn show_descriptors(
        &self,
        ids: &BTreeMap<String, String>,
        section_key: &str,
    ) -> Vec<MappingDescriptor> {
        mapping::show_descriptors(
            ids,
            self.config.strict,
            self.strict_providers.get(section_key).copied(),
        )
    }

    /// Wrap a raw Jellyfin item according to its `Type`.
    fn entry_from_item(&self, item: &BaseItemDto, section_key: &str) -> Result<LibraryEntry> {
        let kind = match item.item_type() {
            "Movie" => MediaKind::Movie,
            "Series" => MediaKind::Show,
            "Season" => MediaKind::Season,
            "Episode" => MediaKind::Episode,
            other => return Err(Error::UnsupportedMediaType(other.to_string())),
        };

        let user_data = item.user_data.as_ref();
        let index = to_index(item.index_number);
        let (show_key, season_key, season_index) = match kind {
            MediaKind::Season => (
                item.series_id.clone().or_else(|| item.parent_id.clone()),
                None,
                index,
            ),
            MediaKind::Episode => (
                item.series_id.clone(),
                item.season_id.clone().or_else(|| item.parent_id.clone()),
                to_index(item.parent_index_number),
            ),
            _ => (None, None, 0),
        };

        Ok(LibraryEntry {
            key: item.id().to_string(),
            title: item.name().to_string(),
            kind,
            section_key: section_key.to_string(),
            show_key,
            season_key,
            index,
            season_index,
            on_watching: JellyfinClient::is_on_continue_watching(item),
            on_watchlist: JellyfinClient::is_on_watchlist(item),
            user_rating: user_data
                .and_then(|d| d.rating)
                .map(|rating| (rating * 10.0).round_ties_even() as i32),
            view_count: user_data
                .and_then(|d| d.play_count)
                .map(|count| u32::try_from(count.max(0)).unwrap_or(u32::MAX))
                .unwrap_or(0),
            external_url: (!item.id().is_empty()).then(|| self.client.build_item_url(item.id())),
            genres: item.genres.clone().unwrap_or_default(),
            provider_ids: provider_ids(item),
            poster_tag: item.primary_image_tag().map(str::to_string),
        })
    }

    fn entries_of_kind(
        &self,
        items: &[BaseItemDto],
        section_key: &str,
        kind: MediaKind,
    ) -> Result<Vec<LibraryEntry>> {
        items
            .iter()
            .map(|item| self.entry_from_item(item, section_key))
            .filter(|entry| !matches!(entry, Ok(e) if e.kind != kind))
            .collect()
    }

    fn user_matches(&self, hook: &JellyfinWebhook) -> bool {
        let Some(user) = &self.user else {
            return false;
        };
        hook.user_id().is_some_and(|id| ids_match(&id, &user.key))
            || hook
                .username()
                .is_some_and(|name| name.to_lowercase() == user.title.to_lowercase())
    }
}

#[async_trait]
impl LibraryProvider for JellyfinLibraryProvider {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    async fn initialize(&mut self) -> Result<()> {
        self.client.initialize().await?;

        self.user = Some(LibraryUser {
            key: self.client.user_id()?.to_string(),
            title: self.client.user_name()?.to_string(),
        });
        self.sections = self
            .client
            .sections()
            .iter()
            .map(|view| LibrarySection {
                key: view.id().to_string(),
                title: view.name().to_string(),
                kind: if view.collection_type() == "movies" {
                    MediaKind::Movie
                } else {
                    MediaKind::Show
                },
            })
            .collect();
        self.strict_providers = self.build_strict_providers();
        self.parents.lock().clear();

        info!(
            sections = self.sections.len(),
            strict = self.config.strict,
            "Jellyfin provider ready"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.client.close();
        self.user = None;
        self.sections.clear();
        self.strict_providers.clear();
        self.parents.lock().clear();
        debug!("Jellyfin provider closed");
        Ok(())
    }

    fn user(&self) -> Option<&LibraryUser> {
        self.user.as_ref()
    }

    async fn sections(&self) -> Result<Vec<LibrarySection>> {
        if self.user.is_none() {
            return Err(Error::NotInitialized);
        }
        Ok(self.sections.clone())
    }

    async fn list_items(
        &self,
        section: &LibrarySection,
        query: &ItemQuery,
    ) -> Result<Vec<LibraryEntry>> {
        if self.user.is_none() {
            return Err(Error::NotInitialized);
        }
        let section = self.section(&section.key)?;
        let view = self
            .client
            .section(&section.key)
            .ok_or_else(|| Error::not_found("section", &section.key))?;

        let items = self.client.list_section_items(view, query).await?;
        items
            .iter()
            .map(|item| self.entry_from_item(item, &section.key))
            .collect()
    }

    async fn seasons(&self, show: &LibraryEntry) -> Result<Vec<LibraryEntry>> {
        if show.kind != MediaKind::Show {
            return Err(Error::UnsupportedMediaType(format!(
                "{} has no seasons",
                show.kind
            )));
        }

        let items = self.client.list_show_seasons(&show.key).await?;
        let mut seasons = self.entries_of_kind(&items, &show.section_key, MediaKind::Season)?;
        for season in &mut seasons {
            season.show_key = Some(show.key.clone());
        }
        Ok(seasons)
    }

    async fn episodes(&self, parent: &LibraryEntry) -> Result<Vec<LibraryEntry>> {
        let (show_key, season_key) = match parent.kind {
            MediaKind::Show => (parent.key.clone(), None),
            MediaKind::Season => {
                let show_key = parent.show_key.clone().ok_or(Error::MissingParent {
                    kind: MediaKind::Season,
                    field: "show_key",
                })?;
                (show_key, Some(parent.key.clone()))
            }
            kind => {
                return Err(Error::UnsupportedMediaType(format!(
                    "{kind} has no episodes"
                )))
            }
        };

        let items = self
            .client
            .list_show_episodes(&show_key, season_key.as_deref())
            .await?;
        let mut episodes = self.entries_of_kind(&items, &parent.section_key, MediaKind::Episode)?;
        for episode in &mut episodes {
            episode.show_key = Some(show_key.clone());
            if let Some(season_key) = &season_key {
                episode.season_key = Some(season_key.clone());
            }
        }
        Ok(episodes)
    }

    async fn mapping_descriptors(&self, entry: &LibraryEntry) -> Result<Vec<MappingDescriptor>> {
        match entry.kind {
            MediaKind::Movie => Ok(mapping::movie_descriptors(&entry.provider_ids)),
            MediaKind::Show => Ok(self.show_descriptors(&entry.provider_ids, &entry.section_key)),
            MediaKind::Season => {
                let show_key = entry.show_key.as_deref().ok_or(Error::MissingParent {
                    kind: MediaKind::Season,
                    field: "show_key",
                })?;
                let show = self
                    .show_descriptors_for(show_key, &entry.section_key)
                    .await?;
                Ok(mapping::season_descriptors(&show, entry.index))
            }
            MediaKind::Episode => {
                let season_key = entry.season_key.as_deref().ok_or(Error::MissingParent {
                    kind: MediaKind::Episode,
                    field: "season_key",
                })?;
                let season = self.parent_item(season_key).await?;
                let show_key = entry
                    .show_key
                    .clone()
                    .or_else(|| season.series_id.clone())
                    .ok_or(Error::MissingParent {
                        kind: MediaKind::Episode,
                        field: "show_key",
                    })?;
                let show = self
                    .show_descriptors_for(&show_key, &entry.section_key)
                    .await?;
                Ok(mapping::season_descriptors(
                    &show,
                    to_index(season.index_number),
                ))
            }
        }
    }

    async fn history(&self, entry: &LibraryEntry) -> Result<Vec<HistoryEntry>> {
        let include_episodes = matches!(entry.kind, MediaKind::Show | MediaKind::Season);
        self.client.fetch_history(&entry.key, include_episodes).await
    }

    async fn poster_image(&self, entry: &LibraryEntry) -> Option<String> {
        let tag = entry.poster_tag.as_deref()?;

        let url = match self.client.build_image_url(&entry.key, "Primary", Some(tag)) {
            Ok(url) => url,
            Err(e) => {
                debug!(item = %entry.key, "Failed to build poster url: {}", e);
                return None;
            }
        };

        match self.client.fetch_image(&url).await {
            Ok((content_type, body)) => Some(format!(
                "data:{content_type};base64,{}",
                STANDARD.encode(&body)
            )),
            Err(e) => {
                debug!(item = %entry.key, "Failed to fetch poster: {}", e);
                None
            }
        }
    }

    async fn parse_webhook(&self, request: &WebhookRequest) -> Result<WebhookOutcome> {
        let hook = JellyfinWebhook::from_request(request).await?;

        let event = hook
            .notification_type()
            .ok_or_else(|| Error::Webhook("missing NotificationType".into()))?;
        let key = hook
            .top_level_item_id()
            .ok_or_else(|| Error::Webhook("missing ItemId".into()))?;

        if !SYNC_EVENTS.iter().any(|e| e.eq_ignore_ascii_case(&event)) {
            debug!(event = %event, "Ignoring Jellyfin webhook event");
            return Ok(WebhookOutcome::ignored());
        }

        if !event.eq_ignore_ascii_case("ItemAdded") && !self.user_matches(&hook) {
            debug!(
                event = %event,
                user = hook.username().as_deref().unwrap_or_default(),
                "Ignoring Jellyfin webhook for another user"
            );
            return Ok(WebhookOutcome::ignored());
        }

        info!(event = %event, key = %key, "Jellyfin webhook matched");
        Ok(WebhookOutcome::sync(vec![key]))
    }

    async fn clear_cache(&self) -> Result<()> {
        self.parents.lock().clear();
        Ok(())
    }
}

/// Non-empty provider ids of an item.
fn provider_ids(item: &BaseItemDto) -> BTreeMap<String, String> {
    item.provider_ids
        .iter()
        .flatten()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty()).then(|| (key.clone(), value.to_string()))
        })
        .collect()
}

fn to_index(value: Option<i32>) -> u32 {
    value.and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
}
