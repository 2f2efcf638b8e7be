//! Rules turning Jellyfin provider ids into AniBridge mapping descriptors.
//!
//! Movies and shows map their own ids. Seasons reuse the parent show's ids
//! scoped to the season number, and episodes reuse their season's. With
//! strict matching a show only keeps the id supplied by the top-priority
//! metadata fetcher of its library.

use std::collections::BTreeMap;

use anibridge_library::{MappingDescriptor, MediaKind};

/// AniDB scope for regular episodes.
const ANIDB_REGULAR: &str = "R";
/// AniDB scope for specials (season 0).
const ANIDB_SPECIAL: &str = "S";

/// AniBridge provider for a lower-cased Jellyfin provider id key.
pub fn provider_for_key(kind: MediaKind, key: &str) -> Option<&'static str> {
    let movie = kind == MediaKind::Movie;
    let provider = match key {
        "anidb" => "anidb",
        "anilist" => "anilist",
        "imdb" if movie => "imdb_movie",
        "imdb" => "imdb_show",
        "tmdb" if movie => "tmdb_movie",
        "tmdb" => "tmdb_show",
        "tvdb" if movie => "tvdb_movie",
        "tvdb" => "tvdb_show",
        _ => return None,
    };
    Some(provider)
}

/// AniBridge provider backed by a Jellyfin series metadata fetcher.
pub fn strict_provider_for_fetcher(fetcher: &str) -> Option<&'static str> {
    const FETCHERS: &[(&str, &str)] = &[
        ("AniDB", "anidb"),
        ("AniList", "anilist"),
        ("TheTVDB", "tvdb_show"),
        ("TheMovieDb", "tmdb_show"),
        ("IMDb", "imdb_show"),
    ];
    FETCHERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(fetcher.trim()))
        .map(|(_, provider)| *provider)
}

/// Unscoped descriptors for every recognised, non-empty provider id.
pub fn base_descriptors(
    kind: MediaKind,
    provider_ids: &BTreeMap<String, String>,
) -> Vec<MappingDescriptor> {
    provider_ids
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(key, value)| {
            provider_for_key(kind, &key.to_lowercase())
                .map(|provider| MappingDescriptor::new(provider, value.as_str(), None))
        })
        .collect()
}

pub fn movie_descriptors(provider_ids: &BTreeMap<String, String>) -> Vec<MappingDescriptor> {
    base_descriptors(MediaKind::Movie, provider_ids)
        .into_iter()
        .map(|d| {
            if d.provider == "anidb" {
                d.with_scope(Some(ANIDB_REGULAR.to_string()))
            } else {
                d
            }
        })
        .collect()
}

/// Show descriptors. `required` is the section's strict provider; with
/// `strict` set and no required provider nothing is returned.
pub fn show_descriptors(
    provider_ids: &BTreeMap<String, String>,
    strict: bool,
    required: Option<&str>,
) -> Vec<MappingDescriptor> {
    let descriptors = base_descriptors(MediaKind::Show, provider_ids);
    if !strict {
        return descriptors;
    }
    match required {
        Some(required) => descriptors
            .into_iter()
            .filter(|d| d.provider == required)
            .collect(),
        None => Vec::new(),
    }
}

/// Scope a show's descriptors to one season.
pub fn season_descriptors(
    show_descriptors: &[MappingDescriptor],
    season_index: u32,
) -> Vec<MappingDescriptor> {
    show_descriptors
        .iter()
        .map(|d| {
            let scope = match d.provider.as_str() {
                "anilist" => None,
                "anidb" if season_index == 0 => Some(ANIDB_SPECIAL.to_string()),
                "anidb" => Some(ANIDB_REGULAR.to_string()),
                _ => Some(format!("s{season_index}")),
            };
            d.with_scope(scope)
        })
        .collect()
}
