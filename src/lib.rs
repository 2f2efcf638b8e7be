//! AniBridge library provider for Jellyfin.
//!
//! [`JellyfinLibraryProvider`] implements [`anibridge_library::LibraryProvider`]
//! on top of the Jellyfin REST API. The library crate is exposed for the CLI
//! and for integration testing.

pub mod client;
pub mod config;
pub mod filter;
pub mod mapping;
pub mod provider;
pub mod server;
pub mod webhook;

pub use config::ProviderConfig;
pub use provider::{JellyfinLibraryProvider, NAMESPACE};
