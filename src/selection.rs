//! Include / exclude rules deciding which SVG files may enter the sprite.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Filter applied to SVG paths relative to the source directory.
pub trait AssetInclusion {
  /// Returns `true` when the asset at `relative_path` may be bundled.
  fn is_included(&self, relative_path: &str) -> bool;
}

/// Local override file name searched for next to the project configuration.
pub const DEFAULT_SELECTION_FILE: &str = "sprite.local.json";

#[derive(Debug, Default, Deserialize)]
struct AssetSelectionFile {
  #[serde(default)]
  include: Vec<String>,
  #[serde(default)]
  exclude: Vec<String>,
}

/// Path scope rules. A rule matches the path itself and everything below it.
#[derive(Debug, Clone, Default)]
pub struct AssetSelection {
  include: Option<BTreeSet<String>>,
  exclude: BTreeSet<String>,
}

/// Errors that can occur while loading a selection override file.
#[derive(Debug, thiserror::Error)]
pub enum AssetSelectionError {
  /// Failed to read the file.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the file.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl AssetSelection {
  /// Build a selection from raw include and exclude rules.
  pub fn new(
    include: impl IntoIterator<Item = String>,
    exclude: impl IntoIterator<Item = String>,
  ) -> Self {
    let include = normalise_rules(include);
    Self {
      include: (!include.is_empty()).then_some(include),
      exclude: normalise_rules(exclude),
    }
  }

  /// Load rules from `path`. A missing file selects everything.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, AssetSelectionError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => {
        return Err(AssetSelectionError::Io {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let file: AssetSelectionFile =
      serde_json::from_str(&contents).map_err(|source| AssetSelectionError::Parse {
        path: path.to_path_buf(),
        source,
      })?;
    Ok(Self::new(file.include, file.exclude))
  }

  /// Whether no rule is active.
  pub fn is_unfiltered(&self) -> bool {
    self.include.is_none() && self.exclude.is_empty()
  }
}

impl AssetInclusion for AssetSelection {
  fn is_included(&self, relative_path: &str) -> bool {
    let relative_path = relative_path.trim_start_matches("./").trim_start_matches('/');
    if self
      .exclude
      .iter()
      .any(|rule| scope_matches(rule, relative_path))
    {
      return false;
    }

    self
      .include
      .as_ref()
      .is_none_or(|include| include.iter().any(|rule| scope_matches(rule, relative_path)))
  }
}

fn normalise_rules(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
  values
    .into_iter()
    .map(|value| value.trim().replace('\\', "/").trim_matches('/').to_string())
    .filter(|value| !value.is_empty())
    .collect()
}

fn scope_matches(rule: &str, candidate: &str) -> bool {
  candidate == rule
    || candidate
      .strip_prefix(rule)
      .is_some_and(|suffix| suffix.starts_with('/'))
}
