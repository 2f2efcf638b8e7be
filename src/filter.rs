//! Filters applied to Jellyfin listings.
//!
//! Section names and genres compare case-insensitively. Ids compare
//! case-insensitively and ignore dashes, since Jellyfin emits GUIDs both with
//! and without them.

use std::collections::HashSet;

use anibridge_library::ItemQuery;

use crate::client::BaseItemDto;

/// Canonical form of a Jellyfin id.
pub fn normalize_id(id: &str) -> String {
    id.chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn ids_match(a: &str, b: &str) -> bool {
    normalize_id(a) == normalize_id(b)
}

/// True when the filter is empty or one of the item's genres is in it.
pub fn matches_genres(item: &BaseItemDto, filter: &HashSet<String>) -> bool {
    if filter.is_empty() {
        return true;
    }
    item.genres
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|genre| filter.contains(&genre.to_lowercase()))
}

/// Apply the cutoff, watched and key criteria of `query`.
pub fn matches_query(item: &BaseItemDto, query: &ItemQuery) -> bool {
    if let Some(cutoff) = query.min_last_modified {
        if item.last_modified().is_some_and(|modified| modified < cutoff) {
            return false;
        }
    }

    if query.require_watched {
        let watched = item
            .user_data
            .as_ref()
            .is_some_and(|d| d.played || d.play_count.unwrap_or(0) > 0);
        if !watched {
            return false;
        }
    }

    if let Some(keys) = &query.keys {
        let id = normalize_id(item.id());
        if !keys.iter().any(|key| normalize_id(key) == id) {
            return false;
        }
    }

    true
}
