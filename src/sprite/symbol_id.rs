//! Symbol identifier generation for sprite entries.

use std::fmt;
use std::path::Path;

/// Caller supplied identifier function receiving `(path, fingerprint, content)`.
pub type GenerateSymbolId = Box<dyn FnMut(&Path, &str, &str) -> String>;

/// Produces the identifier each asset is exposed under inside the sprite.
///
/// Without a custom function the generator hands out `"0"`, `"1"`, `"2"`, ... and ignores its
/// arguments. Uniqueness of custom identifiers is up to the caller.
#[derive(Default)]
pub struct SymbolIdGenerator {
  counter: u64,
  custom: Option<GenerateSymbolId>,
}

impl SymbolIdGenerator {
  /// Generator delegating to `generate`.
  pub fn custom(generate: GenerateSymbolId) -> Self {
    Self {
      counter: 0,
      custom: Some(generate),
    }
  }

  /// Identifier for the asset at `path`.
  pub fn generate(&mut self, path: &Path, fingerprint: &str, content: &str) -> String {
    if let Some(generate) = self.custom.as_mut() {
      return generate(path, fingerprint, content);
    }

    let id = self.counter.to_string();
    self.counter += 1;
    id
  }
}

impl fmt::Debug for SymbolIdGenerator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SymbolIdGenerator")
      .field("counter", &self.counter)
      .field("custom", &self.custom.is_some())
      .finish()
  }
}
