//! Integration tests for loading the provider configuration.

mod common;

use anibridge_jellyfin::config::load_config_or_default;
use anibridge_jellyfin::{JellyfinLibraryProvider, ProviderConfig};
use anibridge_library::{Error, LibraryProvider};
use common::JellyfinMock;
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn config_file_drives_provider() {
    let mock = JellyfinMock::start().await;
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("anibridge.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[library_provider_config.jellyfin]
url = "{}/"
token = "secret"
user = "Demo"
sections = ["Movies"]
genres = ["Animation"]
"#,
            mock.server.uri()
        ),
    )
    .unwrap();

    let config = load_config_or_default(Some(&config_path)).unwrap();
    assert!(config.strict);

    let mut provider = JellyfinLibraryProvider::new(config).unwrap();
    provider.initialize().await.unwrap();

    let sections = provider.sections().await.unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Movies");
}

#[test]
fn host_configuration_object() {
    let provider = JellyfinLibraryProvider::from_value(json!({
        "url": "http://jellyfin:8096",
        "token": "secret",
        "user": "demo",
        "strict": false,
    }))
    .unwrap();

    assert_eq!(provider.namespace(), "jellyfin");
    assert!(!provider.config().strict);
    assert!(provider.config().sections.is_empty());
}

#[test]
fn incomplete_configuration_is_rejected() {
    let err = ProviderConfig::from_value(json!({ "url": "http://jellyfin:8096" })).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn invalid_toml_is_rejected() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("broken.toml");
    std::fs::write(&config_path, "library_provider_config = [").unwrap();

    let err = load_config_or_default(Some(&config_path)).unwrap_err();
    assert!(err.to_string().contains("config parse error"));
}
