//! Shared test harness for integration tests.
//!
//! [`JellyfinMock`] starts a `wiremock` server that answers the Jellyfin
//! endpoints used by the provider with a small fixture library:
//!
//! - user `Demo` (`user-1`) and `Other` (`user-2`)
//! - `Movies` (`sec-movies`) with `movie-1` and `movie-2`
//! - `Anime` (`sec-shows`) with `show-1`, seasons `season-0` and `season-1`,
//!   episodes `episode-1` and `episode-2` in season 1
//! - `Music` (`sec-music`), which the provider must skip

#![allow(dead_code)]

use std::net::SocketAddr;

use anibridge_jellyfin::server::{create_router, AppContext};
use anibridge_jellyfin::{JellyfinLibraryProvider, ProviderConfig};
use anibridge_library::LibraryProvider;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "secret";
pub const POSTER_BYTES: &[u8] = b"\x89PNG fake";

pub struct JellyfinMock {
    pub server: MockServer,
}

impl JellyfinMock {
    /// Start the mock server with every fixture mounted.
    pub async fn start() -> Self {
        Self::start_with_fetchers(json!(["TheTVDB", "AniDB"]), json!(["TheTVDB", "AniDB"])).await
    }

    /// Start the mock server with custom series fetcher settings for the
    /// `Anime` library.
    pub async fn start_with_fetchers(order: Value, enabled: Value) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/Users"))
            .and(header("Authorization", "MediaBrowser Token=\"secret\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(users()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/Users/user-1/Views"))
            .respond_with(ResponseTemplate::new(200).set_body_json(views()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/Library/VirtualFolders"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(virtual_folders(order, enabled)),
            )
            .mount(&server)
            .await;

        let listings = [
            ("sec-movies", "Movie", vec![movie_1(), movie_2()]),
            ("sec-shows", "Series", vec![show_1()]),
            ("show-1", "Season", vec![season_0(), season_1()]),
            ("show-1", "Episode", vec![episode_1(), episode_2()]),
            ("season-1", "Episode", vec![episode_1(), episode_2()]),
            ("season-0", "Episode", vec![]),
        ];
        for (parent, item_type, items) in listings {
            Mock::given(method("GET"))
                .and(path("/Items"))
                .and(query_param("userId", "user-1"))
                .and(query_param("parentId", parent))
                .and(query_param("includeItemTypes", item_type))
                .and(query_param("recursive", "true"))
                .respond_with(ResponseTemplate::new(200).set_body_json(items_result(items)))
                .mount(&server)
                .await;
        }

        for item in [show_1(), season_0(), season_1(), movie_1(), movie_2()] {
            let id = item["Id"].as_str().unwrap_or_default().to_string();
            Mock::given(method("GET"))
                .and(path(format!("/Items/{id}")))
                .and(query_param("userId", "user-1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(item))
                .mount(&server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/Items/movie-1/Images/Primary"))
            .and(query_param("tag", "tag-1"))
            .and(header("X-Emby-Token", TOKEN))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/png")
                    .set_body_bytes(POSTER_BYTES),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/Items/.+/Images/Primary$"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn config(&self) -> ProviderConfig {
        ProviderConfig::new(self.server.uri(), TOKEN, "demo")
    }

    /// An initialized provider using the default configuration.
    pub async fn provider(&self) -> JellyfinLibraryProvider {
        self.provider_with(|_| {}).await
    }

    /// An initialized provider after `configure` adjusted the configuration.
    pub async fn provider_with(
        &self,
        configure: impl FnOnce(&mut ProviderConfig),
    ) -> JellyfinLibraryProvider {
        let mut config = self.config();
        configure(&mut config);
        let mut provider = JellyfinLibraryProvider::new(config).expect("valid config");
        provider.initialize().await.expect("initialize provider");
        provider
    }

    /// Number of requests received for an exact path.
    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .count()
    }

    /// Start the webhook receiver on a random port.
    pub async fn with_listener(&self) -> SocketAddr {
        let app = create_router(AppContext::new(self.provider().await));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn users() -> Value {
    json!([
        { "Id": "user-2", "Name": "Other" },
        { "Id": "user-1", "Name": "Demo" },
    ])
}

fn views() -> Value {
    json!({
        "Items": [
            { "Id": "sec-movies", "Name": "Movies", "CollectionType": "movies" },
            { "Id": "sec-shows", "Name": "Anime", "CollectionType": "tvshows" },
            { "Id": "sec-music", "Name": "Music", "CollectionType": "music" },
        ],
        "TotalRecordCount": 3
    })
}

fn virtual_folders(order: Value, enabled: Value) -> Value {
    json!([
        {
            "Name": "Movies",
            "ItemId": "sec-movies",
            "CollectionType": "movies",
            "LibraryOptions": { "TypeOptions": [] }
        },
        {
            "Name": "Anime",
            "ItemId": "sec-shows",
            "CollectionType": "tvshows",
            "LibraryOptions": {
                "TypeOptions": [
                    { "Type": "Season", "MetadataFetchers": ["TheMovieDb"] },
                    {
                        "Type": "Series",
                        "MetadataFetchers": enabled,
                        "MetadataFetcherOrder": order
                    }
                ]
            }
        }
    ])
}

fn items_result(items: Vec<Value>) -> Value {
    let count = items.len();
    json!({ "Items": items, "TotalRecordCount": count })
}

pub fn movie_1() -> Value {
    json!({
        "Id": "movie-1",
        "Name": "Movie One",
        "Type": "Movie",
        "Genres": ["Animation", "Drama"],
        "ProviderIds": { "Imdb": "tt0001", "Tmdb": "10", "AniDB": "42", "Tvdb": "" },
        "UserData": {
            "Played": true,
            "PlayCount": 1,
            "Rating": 8.0,
            "IsFavorite": true,
            "PlaybackPositionTicks": 0,
            "LastPlayedDate": "2025-01-11T20:00:00.0000000Z"
        },
        "DateCreated": "2025-01-10T12:00:00.0000000Z",
        "ImageTags": { "Primary": "tag-1" }
    })
}

pub fn movie_2() -> Value {
    json!({
        "Id": "movie-2",
        "Name": "Movie Two",
        "Type": "Movie",
        "Genres": ["Documentary"],
        "ProviderIds": { "Imdb": "tt0002" },
        "UserData": { "Played": false, "PlayCount": 0, "PlaybackPositionTicks": 600000000 },
        "DateCreated": "2024-03-01T12:00:00.0000000Z",
        "ImageTags": { "Primary": "tag-2" }
    })
}

pub fn show_1() -> Value {
    json!({
        "Id": "show-1",
        "Name": "Show One",
        "Type": "Series",
        "Genres": ["Animation"],
        "ProviderIds": { "Tvdb": "55", "AniDB": "42", "Tmdb": "9", "Imdb": null },
        "UserData": { "Played": false, "PlayCount": 0, "IsFavorite": false },
        "DateCreated": "2024-06-01T00:00:00.0000000Z",
        "DateLastMediaAdded": "2025-01-12T00:00:00.0000000Z"
    })
}

pub fn season_0() -> Value {
    json!({
        "Id": "season-0",
        "Name": "Specials",
        "Type": "Season",
        "IndexNumber": 0,
        "SeriesId": "show-1",
        "ParentId": "show-1"
    })
}

pub fn season_1() -> Value {
    json!({
        "Id": "season-1",
        "Name": "Season 1",
        "Type": "Season",
        "IndexNumber": 1,
        "SeriesId": "show-1",
        "ParentId": "show-1"
    })
}

pub fn episode_1() -> Value {
    json!({
        "Id": "episode-1",
        "Name": "Episode One",
        "Type": "Episode",
        "IndexNumber": 1,
        "ParentIndexNumber": 1,
        "SeriesId": "show-1",
        "SeasonId": "season-1",
        "ParentId": "season-1",
        "UserData": {
            "Played": true,
            "PlayCount": 2,
            "LastPlayedDate": "2025-01-12T21:30:00.0000000Z"
        }
    })
}

pub fn episode_2() -> Value {
    json!({
        "Id": "episode-2",
        "Name": "Episode Two",
        "Type": "Episode",
        "IndexNumber": 2,
        "ParentIndexNumber": 1,
        "SeriesId": "show-1",
        "SeasonId": "season-1",
        "ParentId": "season-1",
        "UserData": { "Played": false, "PlayCount": 0 }
    })
}

