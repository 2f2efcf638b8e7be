//! The [`LibraryProvider`] trait and the webhook types it exchanges with the
//! host.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::media::{
    HistoryEntry, ItemQuery, LibraryEntry, LibrarySection, LibraryUser, MappingDescriptor,
};

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

/// A raw webhook request forwarded by the host.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl WebhookRequest {
    pub fn new(content_type: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    /// Convenience constructor for a JSON body.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::new(Some("application/json".to_string()), body)
    }
}

/// What the host should do in response to a webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookOutcome {
    /// Whether the event is relevant for synchronization.
    pub matched: bool,
    /// Top-level library keys that should be re-synchronized.
    pub keys: Vec<String>,
}

impl WebhookOutcome {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn sync(keys: Vec<String>) -> Self {
        Self {
            matched: true,
            keys,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait implemented by every media server integration.
///
/// Lifecycle methods take `&mut self`; everything else borrows the provider
/// immutably so a host can share an initialized provider behind an `Arc`.
#[async_trait]
pub trait LibraryProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"jellyfin"`).
    fn namespace(&self) -> &'static str;

    /// Connect to the media server and load the state needed by the other
    /// methods.
    async fn initialize(&mut self) -> Result<()>;

    /// Release any resources held by the provider.
    async fn close(&mut self) -> Result<()>;

    /// The user whose library is exposed, once initialized.
    fn user(&self) -> Option<&LibraryUser>;

    /// Sections visible to the provider user.
    async fn sections(&self) -> Result<Vec<LibrarySection>>;

    /// Top-level items (movies or shows) of `section` matching `query`.
    async fn list_items(
        &self,
        section: &LibrarySection,
        query: &ItemQuery,
    ) -> Result<Vec<LibraryEntry>>;

    /// Seasons of a show.
    async fn seasons(&self, show: &LibraryEntry) -> Result<Vec<LibraryEntry>>;

    /// Episodes of a show or of a single season.
    async fn episodes(&self, parent: &LibraryEntry) -> Result<Vec<LibraryEntry>>;

    /// Mapping descriptors used to match `entry` to external databases.
    async fn mapping_descriptors(&self, entry: &LibraryEntry) -> Result<Vec<MappingDescriptor>>;

    /// Viewing history of an entry.
    async fn history(&self, entry: &LibraryEntry) -> Result<Vec<HistoryEntry>>;

    /// Poster artwork as a `data:` URL, if available.
    async fn poster_image(&self, entry: &LibraryEntry) -> Option<String>;

    /// The user's review text for an entry.
    async fn review(&self, _entry: &LibraryEntry) -> Result<Option<String>> {
        Ok(None)
    }

    /// Decide whether a webhook request should trigger a synchronization.
    async fn parse_webhook(&self, request: &WebhookRequest) -> Result<WebhookOutcome>;

    /// Reset any cached server responses.
    async fn clear_cache(&self) -> Result<()>;
}
