#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod host;
pub mod loader;
pub mod models;
pub mod plugin;
pub mod references;
pub mod selection;
pub mod sprite;

pub use builder::{SpriteArtifacts, SpriteBuildContext, SpriteBuilder};
pub use config::SpriteConfig;
pub use plugin::{SpritePlugin, SpritePluginOptions};
pub use selection::{AssetInclusion, AssetSelection};
