//! anibridge-library: the contract between AniBridge and its library providers.
//!
//! A library provider exposes the sections, items and watch state of a single
//! media server. This crate holds the [`LibraryProvider`] trait, the
//! normalized data types handed back to the host, and the shared error type.

pub mod error;
pub mod media;
pub mod provider;

pub use error::{Error, Result};
pub use media::*;
pub use provider::{LibraryProvider, WebhookOutcome, WebhookRequest};
