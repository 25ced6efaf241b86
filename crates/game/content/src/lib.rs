//! Data-driven content definitions and loaders.
//!
//! This crate provides the story document loader (JSON or TOML) and ships a
//! bundled six-node timeline used when no document is present on disk.
//!
//! Content is read once at startup and never appears in player state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{BUNDLED_CONFIG, ConfigFormat, ConfigLoader, ContentFactory, LoadResult};
