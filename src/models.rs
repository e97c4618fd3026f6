//! Data structures produced while collecting and bundling sprite assets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single SVG asset discovered by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
  /// Symbol identifier the asset is exposed under inside the sprite.
  pub id: String,
  /// Hex encoded SHA-256 of the raw content.
  pub fingerprint: String,
  /// Path the asset was loaded from.
  pub source_path: PathBuf,
  /// Raw SVG markup as read from disk.
  pub raw_content: String,
}

impl AssetRecord {
  /// Build a record, computing the fingerprint from `raw_content`.
  pub fn new(id: impl Into<String>, source_path: impl Into<PathBuf>, raw_content: impl Into<String>) -> Self {
    let raw_content = raw_content.into();
    Self {
      id: id.into(),
      fingerprint: fingerprint(&raw_content),
      source_path: source_path.into(),
      raw_content,
    }
  }

  /// Source path rendered with forward slashes for manifests.
  pub fn display_path(&self) -> String {
    self.source_path.to_string_lossy().replace('\\', "/")
  }
}

/// Content fingerprint used to deduplicate identical assets.
pub fn fingerprint(content: &str) -> String {
  let digest = Sha256::digest(content.as_bytes());
  format!("{digest:x}")
}

/// Serializable summary of a sprite symbol.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSymbolSummary {
  /// Symbol identifier.
  pub id: String,
  /// Source path relative to the project root when possible.
  pub source_path: String,
  /// Content fingerprint.
  pub fingerprint: String,
}

/// Serializable summary of a sprite build written next to the emitted pages.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteManifestSummary {
  /// Symbols in registry order.
  pub symbols: Vec<SpriteSymbolSummary>,
  /// Pages written, relative to the output directory.
  pub pages: Vec<String>,
  /// Number of times the sprite had to be composed.
  pub compositions: usize,
}

impl SpriteSymbolSummary {
  /// Summarise a record, stripping `root` from its path when it is a prefix.
  pub fn from_record(record: &AssetRecord, root: &Path) -> Self {
    let source_path = match record.source_path.strip_prefix(root) {
      Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
      Err(_) => record.display_path(),
    };
    Self {
      id: record.id.clone(),
      source_path,
      fingerprint: record.fingerprint.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_content_shares_fingerprint() {
    let one = AssetRecord::new("0", "icons/a.svg", "<svg/>");
    let two = AssetRecord::new("1", "icons/b.svg", "<svg/>");
    assert_eq!(one.fingerprint, two.fingerprint);
    assert_eq!(one.fingerprint.len(), 64);
  }

  #[test]
  fn summary_strips_project_root() {
    let record = AssetRecord::new("logo", "/site/src/icons/logo.svg", "<svg/>");
    let summary = SpriteSymbolSummary::from_record(&record, Path::new("/site/src"));
    assert_eq!(summary.source_path, "icons/logo.svg");

    let outside = SpriteSymbolSummary::from_record(&record, Path::new("/elsewhere"));
    assert_eq!(outside.source_path, "/site/src/icons/logo.svg");
  }
}
