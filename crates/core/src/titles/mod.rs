//! Title resolution for matched anime.
//!
//! This module provides a `TitleFetcher` trait for metadata backends, an
//! AniList GraphQL implementation, and the `TitleResolver` that fans out one
//! lookup per distinct id.

mod anilist;
mod resolver;
mod types;

pub use anilist::AnilistClient;
pub use resolver::TitleResolver;
pub use types::*;
