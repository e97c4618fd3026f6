//! Per-build sprite state and the emission hook that keeps the sprite current.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::host::{EmitError, HtmlEmitHook, HtmlPluginData};
use crate::models::AssetRecord;
use crate::sprite::compose::SpriteComposer;
use crate::sprite::inject::inject_sprite_at;
use crate::sprite::registry::AssetRegistry;
use crate::sprite::symbol_id::SymbolIdGenerator;

/// Handle shared between loader callables and the emission hook.
pub type SharedSpriteState = Rc<RefCell<SpriteState>>;

/// Everything the sprite plugin remembers during one build invocation.
#[derive(Debug, Default)]
pub struct SpriteState {
  ids: SymbolIdGenerator,
  registry: AssetRegistry,
  last_composed_version: Option<u64>,
  cached_sprite: Option<String>,
  compositions: usize,
}

impl SpriteState {
  /// State using `ids` for symbol identifiers.
  pub fn new(ids: SymbolIdGenerator) -> Self {
    Self {
      ids,
      ..Self::default()
    }
  }

  /// Wrap the state in a shared handle.
  pub fn shared(self) -> SharedSpriteState {
    Rc::new(RefCell::new(self))
  }

  /// Symbol id for an asset about to be registered.
  pub fn generate_id(&mut self, path: &Path, fingerprint: &str, content: &str) -> String {
    self.ids.generate(path, fingerprint, content)
  }

  /// Register `record` and return the id its content is exposed under.
  ///
  /// Re-discovering known content keeps the id of the record already in the registry.
  pub fn insert(&mut self, record: AssetRecord) -> String {
    let id = record.id.clone();
    let path = record.source_path.clone();
    let fingerprint = record.fingerprint.clone();
    if self.registry.insert(record) {
      debug!(id = %id, path = %path.display(), version = self.registry.version(), "registered sprite asset");
      return id;
    }

    self
      .registry
      .records()
      .iter()
      .find(|existing| existing.fingerprint == fingerprint)
      .map(|existing| existing.id.clone())
      .unwrap_or(id)
  }

  /// Registered assets.
  pub fn registry(&self) -> &AssetRegistry {
    &self.registry
  }

  /// Most recently composed sprite.
  pub fn cached_sprite(&self) -> Option<&str> {
    self.cached_sprite.as_deref()
  }

  /// Registry version the cached sprite was composed from.
  pub fn last_composed_version(&self) -> Option<u64> {
    self.last_composed_version
  }

  /// Number of successful compositions so far.
  pub fn compositions(&self) -> usize {
    self.compositions
  }

  fn reusable_sprite(&self) -> Option<&str> {
    if self.last_composed_version == Some(self.registry.version()) {
      self.cached_sprite.as_deref()
    } else {
      None
    }
  }
}

/// Emission hook composing the sprite when the registry moved and injecting it into each page.
pub struct EmissionCoordinator {
  state: SharedSpriteState,
  composer: Rc<dyn SpriteComposer>,
  marker: String,
}

impl EmissionCoordinator {
  /// Coordinator over `state`, composing with `composer` and injecting after `marker`.
  pub fn new(state: SharedSpriteState, composer: Rc<dyn SpriteComposer>, marker: impl Into<String>) -> Self {
    Self {
      state,
      composer,
      marker: marker.into(),
    }
  }
}

#[async_trait(?Send)]
impl HtmlEmitHook for EmissionCoordinator {
  async fn before_emit(&self, mut data: HtmlPluginData) -> Result<HtmlPluginData, EmitError> {
    let (records, version) = {
      let state = self.state.borrow();
      if let Some(sprite) = state.reusable_sprite() {
        debug!(page = %data.output_name, "registry unchanged, reusing cached sprite");
        data.html = inject_sprite_at(&data.html, sprite, &self.marker);
        return Ok(data);
      }
      (state.registry.records().to_vec(), state.registry.version())
    };

    debug!(page = %data.output_name, version, symbols = records.len(), "composing sprite");
    let sprite = match self.composer.compose(&records).await {
      Ok(sprite) => sprite,
      Err(source) => {
        error!(page = %data.output_name, error = %source, "sprite composition failed");
        return Err(EmitError::Compose {
          page: data.output_name,
          source,
        });
      }
    };

    data.html = inject_sprite_at(&data.html, &sprite, &self.marker);

    let mut state = self.state.borrow_mut();
    state.last_composed_version = Some(version);
    state.cached_sprite = Some(sprite);
    state.compositions += 1;

    Ok(data)
  }
}
