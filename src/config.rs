//! Project configuration loader describing where pages live and how symbols are named.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::selection::AssetSelection;
use crate::sprite::{DEFAULT_MARKER, GenerateSymbolId};

/// Configuration file looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "sprite.config.json";

/// How symbol ids are derived from discovered assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolIdStrategy {
  /// `0`, `1`, `2`, ... in discovery order.
  #[default]
  Counter,
  /// Sanitised file stem, e.g. `icons/Arrow Left.svg` becomes `arrow-left`.
  FileStem,
  /// First eight characters of the content fingerprint.
  ContentHash,
}

/// Discoverable project configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
  /// Directory, relative to the project root, holding HTML pages and SVG files.
  pub source_dir: String,
  /// Directory, relative to the project root, that emitted pages are written to.
  pub output_dir: String,
  /// Opening marker the sprite is injected after.
  pub marker: String,
  /// Symbol id strategy.
  pub symbol_id: SymbolIdStrategy,
  /// Prefix prepended to every generated symbol id.
  pub symbol_id_prefix: String,
  /// Path scopes, relative to the source directory, allowed into the sprite.
  pub include: Vec<String>,
  /// Path scopes, relative to the source directory, kept out of the sprite.
  pub exclude: Vec<String>,
  /// Optional `class` attribute for the sprite container.
  pub sprite_class: Option<String>,
  /// File name of the JSON manifest written into the output directory.
  pub manifest_file: String,
}

impl Default for SpriteConfig {
  fn default() -> Self {
    Self {
      source_dir: "src".into(),
      output_dir: "dist".into(),
      marker: DEFAULT_MARKER.into(),
      symbol_id: SymbolIdStrategy::Counter,
      symbol_id_prefix: String::new(),
      include: Vec::new(),
      exclude: Vec::new(),
      sprite_class: None,
      manifest_file: "sprite-manifest.json".into(),
    }
  }
}

impl SpriteConfig {
  /// Load `sprite.config.json` from `root`, falling back to defaults when it is missing or invalid.
  pub fn discover(root: &Path) -> Self {
    let candidate = root.join(DEFAULT_CONFIG_FILE);
    if !candidate.exists() {
      return Self::default();
    }
    Self::from_path(&candidate).unwrap_or_else(|| {
      warn!(path = %candidate.display(), "ignoring unreadable sprite configuration");
      Self::default()
    })
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Absolute source directory.
  pub fn source_dir_path(&self, root: &Path) -> PathBuf {
    root.join(&self.source_dir)
  }

  /// Absolute output directory.
  pub fn output_dir_path(&self, root: &Path) -> PathBuf {
    root.join(&self.output_dir)
  }

  /// Selection rules from `include` / `exclude`.
  pub fn selection(&self) -> AssetSelection {
    AssetSelection::new(self.include.clone(), self.exclude.clone())
  }

  /// Id generator for the configured strategy, or `None` for the plain counter.
  pub fn symbol_id_generator(&self) -> Option<GenerateSymbolId> {
    let prefix = self.symbol_id_prefix.clone();
    match self.symbol_id {
      SymbolIdStrategy::Counter if prefix.is_empty() => None,
      SymbolIdStrategy::Counter => {
        let mut counter = 0u64;
        Some(Box::new(move |_: &Path, _: &str, _: &str| {
          let id = format!("{prefix}{counter}");
          counter += 1;
          id
        }))
      }
      SymbolIdStrategy::FileStem => Some(Box::new(move |path: &Path, _: &str, _: &str| {
        let stem = path
          .file_stem()
          .map(|stem| stem.to_string_lossy().into_owned())
          .unwrap_or_default();
        format!("{prefix}{}", sanitize_symbol_id(&stem))
      })),
      SymbolIdStrategy::ContentHash => Some(Box::new(move |_: &Path, fingerprint: &str, _: &str| {
        let short = fingerprint.get(..8).unwrap_or(fingerprint);
        format!("{prefix}{short}")
      })),
    }
  }
}

/// Lowercase `value` and collapse anything outside `[a-z0-9_-]` into single dashes.
pub fn sanitize_symbol_id(value: &str) -> String {
  let mut id = String::with_capacity(value.len());
  for c in value.chars().flat_map(char::to_lowercase) {
    if c.is_ascii_alphanumeric() || c == '_' {
      id.push(c);
    } else if !id.ends_with('-') {
      id.push('-');
    }
  }
  let id = id.trim_matches('-');
  if id.is_empty() {
    "symbol".to_string()
  } else {
    id.to_string()
  }
}
