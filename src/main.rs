mod cli;

use anibridge_jellyfin::{
    config,
    provider::JellyfinLibraryProvider,
    server::{self, AppContext},
};
use anibridge_library::{ItemQuery, LibraryEntry, LibraryProvider, LibrarySection, MediaKind};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "anibridge_jellyfin=trace,anibridge_library=debug,tower_http=debug".to_string()
        } else {
            "anibridge_jellyfin=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    if let Commands::Version = cli.command {
        println!("anibridge-jellyfin {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut provider = connect(cli.config.as_deref()).await?;

    let result = match cli.command {
        Commands::Validate => validate(&provider).await,
        Commands::Sections => list_sections(&provider).await,
        Commands::Items {
            section,
            watched,
            since,
            keys,
            mappings,
        } => {
            let mut query = ItemQuery::new();
            if watched {
                query = query.watched_only();
            }
            if let Some(since) = since {
                let cutoff = DateTime::parse_from_rfc3339(&since)
                    .with_context(|| format!("Invalid --since timestamp: {since}"))?;
                query = query.modified_since(cutoff.with_timezone(&Utc));
            }
            if !keys.is_empty() {
                query = query.with_keys(keys);
            }
            list_items(&provider, &section, &query, mappings).await
        }
        Commands::History { section, key } => show_history(&provider, &section, &key).await,
        Commands::Listen { host, port } => {
            return server::start_server(AppContext::new(provider), &host, port).await;
        }
        Commands::Version => Ok(()),
    };

    if let Err(e) = provider.close().await {
        tracing::warn!("Failed to close Jellyfin provider: {}", e);
    }
    result
}

async fn connect(config_path: Option<&Path>) -> Result<JellyfinLibraryProvider> {
    let config = config::load_config_or_default(config_path)?;
    let mut provider = JellyfinLibraryProvider::new(config)?;
    provider
        .initialize()
        .await
        .context("Failed to connect to Jellyfin")?;
    Ok(provider)
}

async fn validate(provider: &JellyfinLibraryProvider) -> Result<()> {
    let config = provider.config();
    println!("Configuration is valid!");
    println!("  Server: {}", config.url);
    if let Some(user) = provider.user() {
        println!("  User: {} ({})", user.title, user.key);
    }
    println!("  Sections: {}", provider.sections().await?.len());
    println!("  Strict matching: {}", config.strict);
    if !config.genres.is_empty() {
        println!("  Genres: {}", config.genres.join(", "));
    }
    Ok(())
}

async fn list_sections(provider: &JellyfinLibraryProvider) -> Result<()> {
    for section in provider.sections().await? {
        let fetcher = match section.kind {
            MediaKind::Show => provider
                .client()
                .show_metadata_fetcher_for_section(&section.key)
                .unwrap_or("-"),
            _ => "-",
        };
        println!(
            "{}\t{}\t{}\t{}",
            section.key, section.kind, section.title, fetcher
        );
    }
    Ok(())
}

async fn find_section(provider: &JellyfinLibraryProvider, name: &str) -> Result<LibrarySection> {
    provider
        .sections()
        .await?
        .into_iter()
        .find(|s| s.key == name || s.title.eq_ignore_ascii_case(name))
        .with_context(|| format!("No section named {name:?}"))
}

async fn list_items(
    provider: &JellyfinLibraryProvider,
    section: &str,
    query: &ItemQuery,
    mappings: bool,
) -> Result<()> {
    let section = find_section(provider, section).await?;
    let items = provider.list_items(&section, query).await?;

    for item in &items {
        print_entry(item);
        if mappings {
            print_mappings(provider, item, "  ").await?;
            if item.kind == MediaKind::Show {
                for season in provider.seasons(item).await? {
                    println!("  {}\tSeason {}\t{}", season.key, season.index, season.title);
                    print_mappings(provider, &season, "    ").await?;
                }
            }
        }
    }

    tracing::info!("{} items in {}", items.len(), section.title);
    Ok(())
}

async fn show_history(provider: &JellyfinLibraryProvider, section: &str, key: &str) -> Result<()> {
    let section = find_section(provider, section).await?;
    let query = ItemQuery::new().with_keys([key]);
    let entry = provider
        .list_items(&section, &query)
        .await?
        .into_iter()
        .next()
        .with_context(|| format!("No item {key:?} in {}", section.title))?;

    print_entry(&entry);
    for viewing in provider.history(&entry).await? {
        println!("  {}\t{}", viewing.viewed_at.to_rfc3339(), viewing.library_key);
    }
    Ok(())
}

fn print_entry(entry: &LibraryEntry) {
    let watched = if entry.view_count > 0 { "watched" } else { "-" };
    println!(
        "{}\t{}\t{}\t{}",
        entry.key, entry.kind, entry.title, watched
    );
}

async fn print_mappings(
    provider: &JellyfinLibraryProvider,
    entry: &LibraryEntry,
    indent: &str,
) -> Result<()> {
    for d in provider.mapping_descriptors(entry).await? {
        match d.scope {
            Some(scope) => println!("{indent}{}:{}:{}", d.provider, d.entry_id, scope),
            None => println!("{indent}{}:{}", d.provider, d.entry_id),
        }
    }
    Ok(())
}
