//! Minimal bundler host: compilations, loader contexts, module rules and the HTML emission hook.
//!
//! The sprite plugin only talks to the host through these types, so another pipeline can drive
//! it by providing the same seams.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use async_trait::async_trait;
use regex::Regex;

use crate::models::AssetRecord;
use crate::sprite::ComposeError;

/// Page handed to emission hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPluginData {
  /// Page markup, rewritten in place by hooks.
  pub html: String,
  /// Output name of the page relative to the output directory.
  pub output_name: String,
}

/// Errors returned by emission hooks.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
  /// The sprite could not be composed for this page.
  #[error("failed to compose sprite for {page}")]
  Compose {
    /// Output name of the page being emitted.
    page: String,
    /// Underlying composition failure.
    #[source]
    source: ComposeError,
  },
}

/// Hook invoked once per HTML page right before it is written.
#[async_trait(?Send)]
pub trait HtmlEmitHook {
  /// Rewrite `data` and hand it back, or fail the emission of this page.
  async fn before_emit(&self, data: HtmlPluginData) -> Result<HtmlPluginData, EmitError>;
}

/// Named taps on the HTML emission hook, called in registration order.
#[derive(Default)]
pub struct HtmlEmitHooks {
  taps: Vec<(String, Rc<dyn HtmlEmitHook>)>,
}

impl HtmlEmitHooks {
  /// Register `hook` under `name`. A name that is already tapped is left alone.
  pub fn tap(&mut self, name: &str, hook: Rc<dyn HtmlEmitHook>) -> bool {
    if self.taps.iter().any(|(existing, _)| existing == name) {
      return false;
    }
    self.taps.push((name.to_string(), hook));
    true
  }

  /// Number of registered taps.
  pub fn len(&self) -> usize {
    self.taps.len()
  }

  /// Whether nothing is tapped.
  pub fn is_empty(&self) -> bool {
    self.taps.is_empty()
  }

  /// Run every tap over `data`, stopping at the first failure.
  pub async fn call(&self, mut data: HtmlPluginData) -> Result<HtmlPluginData, EmitError> {
    for (_, hook) in &self.taps {
      data = hook.before_emit(data).await?;
    }
    Ok(data)
  }
}

/// Registers a discovered asset and returns the id its content is exposed under.
pub type InsertHandle = Rc<dyn Fn(AssetRecord) -> String>;

/// Produces a symbol id from `(path, fingerprint, content)`.
pub type GenerateIdHandle = Rc<dyn Fn(&Path, &str, &str) -> String>;

/// Callables a loader uses to reach the sprite state.
#[derive(Clone)]
pub struct LoaderHandles {
  /// Dedup-aware insert.
  pub insert: InsertHandle,
  /// Symbol id generation.
  pub generate_id: GenerateIdHandle,
}

/// Per-compilation context shared with loaders.
#[derive(Default)]
pub struct LoaderContext {
  handles: Option<LoaderHandles>,
}

impl LoaderContext {
  /// Attach `handles` unless some are already installed.
  pub fn install(&mut self, handles: LoaderHandles) -> bool {
    if self.handles.is_some() {
      return false;
    }
    self.handles = Some(handles);
    true
  }

  /// Installed handles, if any.
  pub fn handles(&self) -> Option<&LoaderHandles> {
    self.handles.as_ref()
  }
}

/// One pass over the module graph.
#[derive(Default)]
pub struct Compilation {
  loader_context: LoaderContext,
}

impl Compilation {
  /// Context handed to loaders during this compilation.
  pub fn loader_context(&self) -> &LoaderContext {
    &self.loader_context
  }

  /// Mutable loader context, used by plugins to install handles.
  pub fn loader_context_mut(&mut self) -> &mut LoaderContext {
    &mut self.loader_context
  }
}

/// Routes modules whose path matches `test` to `loader`.
#[derive(Debug, Clone)]
pub struct LoaderRule {
  /// Pattern matched against the module path.
  pub test: Regex,
  /// Location of the loader module.
  pub loader: PathBuf,
}

impl LoaderRule {
  /// Whether the rule applies to `path`.
  pub fn matches(&self, path: &Path) -> bool {
    self.test.is_match(&path.to_string_lossy())
  }
}

type CompilationTap = Box<dyn Fn(&mut Compilation)>;

/// Build host driving compilations and page emission.
pub struct Compiler {
  compilation: Compilation,
  compilation_taps: Vec<CompilationTap>,
  module_rules: Vec<LoaderRule>,
  html_emit_hooks: Option<HtmlEmitHooks>,
}

impl Default for Compiler {
  fn default() -> Self {
    Self::new()
  }
}

impl Compiler {
  /// Host exposing the HTML emission hook.
  pub fn new() -> Self {
    Self {
      compilation: Compilation::default(),
      compilation_taps: Vec::new(),
      module_rules: Vec::new(),
      html_emit_hooks: Some(HtmlEmitHooks::default()),
    }
  }

  /// Host that never emits HTML pages.
  pub fn without_html_hooks() -> Self {
    Self {
      html_emit_hooks: None,
      ..Self::new()
    }
  }

  /// Run `tap` on the current compilation and on every later one.
  pub fn on_compilation(&mut self, tap: CompilationTap) {
    tap(&mut self.compilation);
    self.compilation_taps.push(tap);
  }

  /// Replace the current compilation with a fresh one, e.g. on a watch-mode rebuild.
  pub fn start_compilation(&mut self) -> &Compilation {
    self.compilation = Compilation::default();
    for tap in &self.compilation_taps {
      tap(&mut self.compilation);
    }
    &self.compilation
  }

  /// Compilation in progress.
  pub fn compilation(&self) -> &Compilation {
    &self.compilation
  }

  /// Register a module rule unless an identical loader is already routed for the same pattern.
  pub fn add_module_rule(&mut self, rule: LoaderRule) {
    let duplicate = self
      .module_rules
      .iter()
      .any(|existing| existing.loader == rule.loader && existing.test.as_str() == rule.test.as_str());
    if !duplicate {
      self.module_rules.push(rule);
    }
  }

  /// First rule routing `path`.
  pub fn loader_for(&self, path: &Path) -> Option<&LoaderRule> {
    self.module_rules.iter().find(|rule| rule.matches(path))
  }

  /// HTML emission hook, when the host supports it.
  pub fn html_emit_hooks_mut(&mut self) -> Option<&mut HtmlEmitHooks> {
    self.html_emit_hooks.as_mut()
  }

  /// Run the emission hook over a page. Without the hook the page passes through.
  pub async fn emit_html(&self, data: HtmlPluginData) -> Result<HtmlPluginData, EmitError> {
    match &self.html_emit_hooks {
      Some(hooks) => hooks.call(data).await,
      None => Ok(data),
    }
  }
}
