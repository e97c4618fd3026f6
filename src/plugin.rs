//! Plugin wiring the sprite state into a [`Compiler`].

use std::path::{Path, PathBuf};
use std::rc::Rc;

use regex::Regex;
use tracing::{info, warn};

use crate::host::{Compilation, Compiler, LoaderHandles, LoaderRule};
use crate::models::AssetRecord;
use crate::sprite::{
  DEFAULT_MARKER, EmissionCoordinator, GenerateSymbolId, SharedSpriteState, SpriteComposer,
  SpriteState, SymbolIdGenerator, SymbolSpriteComposer,
};

/// Name the plugin taps host hooks under.
pub const PLUGIN_NAME: &str = "SvgSpritePlugin";

/// Construction options for [`SpritePlugin`].
#[derive(Default)]
pub struct SpritePluginOptions {
  /// Replaces the default counter based symbol ids.
  pub generate_symbol_id: Option<GenerateSymbolId>,
  /// Replaces the default `<symbol>` composer.
  pub composer: Option<Rc<dyn SpriteComposer>>,
  /// Opening marker the sprite is injected after. Defaults to `<body`.
  pub marker: Option<String>,
}

/// Collects SVG assets across a build and injects the combined sprite into emitted pages.
pub struct SpritePlugin {
  state: SharedSpriteState,
  composer: Rc<dyn SpriteComposer>,
  marker: String,
}

impl Default for SpritePlugin {
  fn default() -> Self {
    Self::new(SpritePluginOptions::default())
  }
}

impl SpritePlugin {
  /// Create a plugin with its own, empty sprite state.
  pub fn new(options: SpritePluginOptions) -> Self {
    let ids = match options.generate_symbol_id {
      Some(generate) => SymbolIdGenerator::custom(generate),
      None => SymbolIdGenerator::default(),
    };
    Self {
      state: SpriteState::new(ids).shared(),
      composer: options
        .composer
        .unwrap_or_else(|| Rc::new(SymbolSpriteComposer::default())),
      marker: options.marker.unwrap_or_else(|| DEFAULT_MARKER.to_string()),
    }
  }

  /// Location of the companion loader module.
  pub fn loader_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
      .join("src")
      .join("loader.rs")
  }

  /// Module rule routing `.svg` modules to the companion loader.
  pub fn loader_rule() -> LoaderRule {
    LoaderRule {
      test: Regex::new(r"(?i)\.svg$").expect("invalid svg rule regex"),
      loader: Self::loader_path(),
    }
  }

  /// Shared sprite state, for inspection after a build.
  pub fn state(&self) -> SharedSpriteState {
    self.state.clone()
  }

  /// Install loader handles on every compilation and tap the HTML emission hook.
  ///
  /// Hosts without the emission hook still collect assets, but pages are left untouched.
  pub fn apply(&self, compiler: &mut Compiler) {
    let handles = self.loader_handles();
    compiler.on_compilation(Box::new(move |compilation: &mut Compilation| {
      compilation.loader_context_mut().install(handles.clone());
    }));
    compiler.add_module_rule(Self::loader_rule());

    match compiler.html_emit_hooks_mut() {
      Some(hooks) => {
        let coordinator =
          EmissionCoordinator::new(self.state.clone(), self.composer.clone(), self.marker.as_str());
        hooks.tap(PLUGIN_NAME, Rc::new(coordinator));
      }
      None => {
        warn!("{PLUGIN_NAME}: host does not expose an HTML emission hook");
        info!("{PLUGIN_NAME}: assets are still collected, but no sprite will be injected");
      }
    }
  }

  fn loader_handles(&self) -> LoaderHandles {
    let insert_state = self.state.clone();
    let id_state = self.state.clone();
    LoaderHandles {
      insert: Rc::new(move |record: AssetRecord| insert_state.borrow_mut().insert(record)),
      generate_id: Rc::new(move |path: &Path, fingerprint: &str, content: &str| {
        id_state.borrow_mut().generate_id(path, fingerprint, content)
      }),
    }
  }
}
