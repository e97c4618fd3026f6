//! Companion loader turning an SVG module into a sprite symbol reference.

use std::path::Path;

use crate::host::LoaderContext;
use crate::models::{AssetRecord, fingerprint};

/// Errors raised while loading an SVG module.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
  /// The compilation has no sprite handles installed.
  #[error("sprite plugin is not installed for this compilation (loading {0})")]
  NotInstalled(String),
}

/// What a module referencing an SVG resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReference {
  /// Symbol id inside the sprite.
  pub id: String,
  /// Fragment reference usable in `<use href>`.
  pub href: String,
}

/// Register the SVG at `path` with the sprite and return its symbol reference.
pub fn load_svg(context: &LoaderContext, path: &Path, content: &str) -> Result<SymbolReference, LoaderError> {
  let handles = context
    .handles()
    .ok_or_else(|| LoaderError::NotInstalled(path.display().to_string()))?;

  let fingerprint = fingerprint(content);
  let id = (handles.generate_id)(path, &fingerprint, content);
  let id = (handles.insert)(AssetRecord {
    id,
    fingerprint,
    source_path: path.to_path_buf(),
    raw_content: content.to_string(),
  });

  Ok(SymbolReference {
    href: format!("#{id}"),
    id,
  })
}
