//! Normalized library types returned by providers.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Media kinds
// ---------------------------------------------------------------------------

/// The kind of media a section or entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
    Season,
    Episode,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Movie => "Movie",
            MediaKind::Show => "Show",
            MediaKind::Season => "Season",
            MediaKind::Episode => "Episode",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Users and sections
// ---------------------------------------------------------------------------

/// The media server account whose library state is being synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryUser {
    /// Server-side user id.
    pub key: String,
    /// Display name, falling back to the id.
    pub title: String,
}

/// A top-level library collection (e.g. "TV Shows").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    /// Either [`MediaKind::Movie`] or [`MediaKind::Show`].
    pub kind: MediaKind,
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A movie, show, season or episode together with the user's state for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub key: String,
    pub title: String,
    pub kind: MediaKind,
    /// Key of the section the entry was listed from.
    pub section_key: String,
    /// Parent show, for seasons and episodes.
    pub show_key: Option<String>,
    /// Parent season, for episodes.
    pub season_key: Option<String>,
    /// Season number for seasons, episode number for episodes, 0 otherwise.
    pub index: u32,
    /// Season number an episode belongs to, 0 otherwise.
    pub season_index: u32,
    /// Partially watched and not yet finished.
    pub on_watching: bool,
    /// Marked as a favorite / on the watchlist.
    pub on_watchlist: bool,
    /// The user's rating on a 0-100 scale.
    pub user_rating: Option<i32>,
    pub view_count: u32,
    /// Link to the item on the media server's web interface.
    pub external_url: Option<String>,
    pub genres: Vec<String>,
    /// External identifiers reported by the server, keyed by the server's
    /// own provider name (e.g. `"Tvdb"`).
    pub provider_ids: BTreeMap<String, String>,
    /// Opaque tag of the primary artwork, if the item has any.
    pub poster_tag: Option<String>,
}

/// An `(provider, id, scope)` triple used to map an entry onto an external
/// database entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingDescriptor {
    /// AniBridge provider name, e.g. `"anidb"` or `"tvdb_show"`.
    pub provider: String,
    pub entry_id: String,
    /// Part of the external entry this descriptor refers to (`"s1"`, `"R"`...).
    pub scope: Option<String>,
}

impl MappingDescriptor {
    pub fn new(
        provider: impl Into<String>,
        entry_id: impl Into<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            entry_id: entry_id.into(),
            scope,
        }
    }

    /// Return a copy of this descriptor with a different scope.
    pub fn with_scope(&self, scope: Option<String>) -> Self {
        Self {
            provider: self.provider.clone(),
            entry_id: self.entry_id.clone(),
            scope,
        }
    }
}

/// A single viewing of a library item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Key of the item (usually an episode) that was viewed.
    pub library_key: String,
    pub viewed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Criteria for narrowing a section listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Only items added or modified at or after this instant. Items without
    /// a timestamp are always kept.
    pub min_last_modified: Option<DateTime<Utc>>,
    /// Only items the user has watched at least once.
    pub require_watched: bool,
    /// Only items whose key is in this set.
    pub keys: Option<HashSet<String>>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modified_since(mut self, cutoff: DateTime<Utc>) -> Self {
        self.min_last_modified = Some(cutoff);
        self
    }

    pub fn watched_only(mut self) -> Self {
        self.require_watched = true;
        self
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }
}
