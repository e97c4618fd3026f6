//! Sprite build orchestrator: discovers pages, loads their SVG modules and emits injected HTML.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::config::SpriteConfig;
use crate::host::{Compiler, HtmlPluginData};
use crate::loader::load_svg;
use crate::models::{SpriteManifestSummary, SpriteSymbolSummary};
use crate::plugin::{SpritePlugin, SpritePluginOptions};
use crate::references::{collect_svg_references, rewrite_svg_references};
use crate::selection::AssetInclusion;
use crate::sprite::SymbolSpriteComposer;

/// Inputs of a sprite build.
#[derive(Debug, Clone, Copy)]
pub struct SpriteBuildContext<'a> {
  /// Project root the configured directories are relative to.
  pub root: &'a Path,
  /// Project configuration.
  pub config: &'a SpriteConfig,
  /// Write pages without a sprite instead of aborting when composition fails.
  pub keep_going: bool,
}

/// Files and counters produced by a build.
#[derive(Debug)]
pub struct SpriteArtifacts {
  /// Emitted pages.
  pub pages: Vec<PathBuf>,
  /// Location of the JSON manifest.
  pub manifest_path: PathBuf,
  /// Manifest serialised as prettified JSON.
  pub manifest_json: String,
  /// Number of symbols in the final sprite.
  pub symbols: usize,
  /// Number of times the sprite was composed.
  pub compositions: usize,
}

/// High-level helper running the sprite plugin over a directory of HTML pages.
pub struct SpriteBuilder<'a> {
  context: SpriteBuildContext<'a>,
}

impl<'a> SpriteBuilder<'a> {
  /// Create a builder for the provided build context.
  pub fn new(context: SpriteBuildContext<'a>) -> Self {
    Self { context }
  }

  /// Emit every page under the source directory with the sprite injected.
  ///
  /// Pages are processed in path order. Each page's SVG references are loaded before the page
  /// is emitted, so a page only recomposes the sprite when it discovered something new.
  pub async fn build<S: AssetInclusion>(&self, selection: &S) -> Result<SpriteArtifacts> {
    let config = self.context.config;
    let source_dir = absolute_dir(&config.source_dir_path(self.context.root))?;
    let output_dir = absolute_dir(&config.output_dir_path(self.context.root))?;
    if !source_dir.is_dir() {
      bail!("source directory {} does not exist", source_dir.display());
    }

    let mut pages = Vec::new();
    collect_pages(&source_dir, &output_dir, &mut pages)
      .with_context(|| format!("failed to scan {}", source_dir.display()))?;
    pages.sort();

    let plugin = SpritePlugin::new(SpritePluginOptions {
      generate_symbol_id: config.symbol_id_generator(),
      composer: Some(Rc::new(SymbolSpriteComposer {
        class_name: config.sprite_class.clone(),
      })),
      marker: Some(config.marker.clone()),
    });
    let mut compiler = Compiler::new();
    plugin.apply(&mut compiler);

    fs::create_dir_all(&output_dir)
      .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(pages.len());
    let mut page_names = Vec::with_capacity(pages.len());
    for page in &pages {
      let relative = page.strip_prefix(&source_dir).unwrap_or(page.as_path());
      let output_name = relative.to_string_lossy().replace('\\', "/");
      let original = fs::read_to_string(page)
        .with_context(|| format!("failed to read {}", page.display()))?;
      let html = load_page_modules(&compiler, &source_dir, page, &original, selection)?;

      let data = HtmlPluginData {
        html,
        output_name: output_name.clone(),
      };
      let emitted = match compiler.emit_html(data).await {
        Ok(emitted) => emitted,
        // Page as authored: no sprite backs the rewritten `#id` hrefs.
        Err(err) if self.context.keep_going => {
          warn!(page = %output_name, error = %err, "writing page without sprite");
          HtmlPluginData {
            html: original,
            output_name: output_name.clone(),
          }
        }
        Err(err) => return Err(err).with_context(|| format!("failed to emit {output_name}")),
      };

      let destination = output_dir.join(relative);
      if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {}", parent.display()))?;
      }
      fs::write(&destination, emitted.html)
        .with_context(|| format!("failed to write {}", destination.display()))?;
      debug!(page = %output_name, "emitted page");

      written.push(destination);
      page_names.push(output_name);
    }

    let state = plugin.state();
    let state = state.borrow();
    let summary = SpriteManifestSummary {
      symbols: state
        .registry()
        .records()
        .iter()
        .map(|record| SpriteSymbolSummary::from_record(record, &source_dir))
        .collect(),
      pages: page_names,
      compositions: state.compositions(),
    };
    let manifest_json = serde_json::to_string_pretty(&summary)?;
    let manifest_path = output_dir.join(&config.manifest_file);
    fs::write(&manifest_path, &manifest_json)
      .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    info!(
      pages = written.len(),
      symbols = summary.symbols.len(),
      compositions = summary.compositions,
      "sprite build finished"
    );

    Ok(SpriteArtifacts {
      pages: written,
      manifest_path,
      manifest_json,
      symbols: summary.symbols.len(),
      compositions: summary.compositions,
    })
  }
}

/// Run the page's SVG references through the loader and point them at their symbols.
fn load_page_modules<S: AssetInclusion>(
  compiler: &Compiler,
  source_dir: &Path,
  page: &Path,
  html: &str,
  selection: &S,
) -> Result<String> {
  let page_dir = page.parent().unwrap_or(source_dir);
  let mut resolved = BTreeMap::new();

  for reference in collect_svg_references(html) {
    let path = match reference.strip_prefix('/') {
      Some(rooted) => normalize_path(&source_dir.join(rooted)),
      None => normalize_path(&page_dir.join(&reference)),
    };
    let Ok(relative) = path.strip_prefix(source_dir) else {
      warn!(reference = %reference, page = %page.display(), "skipping svg outside the source directory");
      continue;
    };
    let relative = relative.to_string_lossy().replace('\\', "/");
    if !selection.is_included(&relative) {
      debug!(path = %relative, "svg excluded by selection");
      continue;
    }
    if compiler.loader_for(&path).is_none() {
      continue;
    }

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(err) => {
        warn!(path = %path.display(), error = %err, "unable to read referenced svg");
        continue;
      }
    };
    let symbol = load_svg(compiler.compilation().loader_context(), &path, &content)?;
    resolved.insert(reference, symbol.href);
  }

  Ok(rewrite_svg_references(html, &resolved))
}

fn collect_pages(dir: &Path, output_dir: &Path, pages: &mut Vec<PathBuf>) -> std::io::Result<()> {
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let file_name = entry.file_name();
    if file_name.to_string_lossy().starts_with('.') {
      continue;
    }

    let path = entry.path();
    let file_type = entry.file_type()?;
    if file_type.is_dir() {
      if path != output_dir {
        collect_pages(&path, output_dir, pages)?;
      }
    } else if file_type.is_file()
      && path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
    {
      pages.push(path);
    }
  }
  Ok(())
}

/// Anchor a configured directory at the working directory and drop `.`/`..` components.
fn absolute_dir(path: &Path) -> Result<PathBuf> {
  let absolute = std::path::absolute(path)
    .with_context(|| format!("failed to resolve {}", path.display()))?;
  Ok(normalize_path(&absolute))
}

/// Resolve `.` and `..` lexically without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if normalized.file_name().is_some() {
          normalized.pop();
        } else {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  if normalized.as_os_str().is_empty() {
    normalized.push(".");
  }
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::selection::AssetSelection;
  use tempfile::tempdir;

  const STAR: &str = "<svg viewBox=\"0 0 24 24\"><path d=\"M1 1\"/></svg>";
  const DOT: &str = "<svg viewBox=\"0 0 8 8\"><circle r=\"4\"/></svg>";

  fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn normalizes_parent_components() {
    assert_eq!(
      normalize_path(Path::new("./src/pages/../icons/a.svg")),
      PathBuf::from("src/icons/a.svg")
    );
    assert_eq!(normalize_path(Path::new("../a.svg")), PathBuf::from("../a.svg"));
    assert_eq!(normalize_path(Path::new("./.")), PathBuf::from("."));
    assert_eq!(normalize_path(Path::new("icons/..")), PathBuf::from("."));
  }

  #[test]
  fn current_directory_resolves_to_working_directory() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(absolute_dir(Path::new("./.")).unwrap(), cwd);
    assert_eq!(absolute_dir(Path::new(".")).unwrap(), cwd);
    assert_eq!(absolute_dir(Path::new("./dist")).unwrap(), cwd.join("dist"));
  }

  #[test]
  fn collects_pages_skipping_hidden_and_output_dirs() -> std::io::Result<()> {
    let temp = tempdir()?;
    let root = temp.path();
    write(root, "index.html", "");
    write(root, "blog/post.HTML", "");
    write(root, ".cache/skip.html", "");
    write(root, "dist/old.html", "");
    write(root, "icons/a.svg", "");

    let mut pages = Vec::new();
    collect_pages(root, &root.join("dist"), &mut pages)?;
    pages.sort();

    assert_eq!(pages, vec![root.join("blog/post.HTML"), root.join("index.html")]);
    Ok(())
  }

  #[tokio::test]
  async fn builds_pages_and_reuses_sprite() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "src/icons/star.svg", STAR);
    write(root, "src/icons/dot.svg", DOT);
    write(
      root,
      "src/about/index.html",
      r#"<html><body><svg><use href="../icons/star.svg"/></svg><svg><use href="/icons/dot.svg"/></svg></body></html>"#,
    );
    write(
      root,
      "src/index.html",
      r#"<html><body class="home"><svg><use href="icons/star.svg"/></svg></body></html>"#,
    );

    let config = SpriteConfig::default();
    let builder = SpriteBuilder::new(SpriteBuildContext {
      root,
      config: &config,
      keep_going: false,
    });
    let artifacts = builder.build(&AssetSelection::default()).await.unwrap();

    assert_eq!(artifacts.pages.len(), 2);
    assert_eq!(artifacts.symbols, 2);
    assert_eq!(artifacts.compositions, 1);

    let about = fs::read_to_string(root.join("dist/about/index.html")).unwrap();
    assert!(about.contains(r##"<use href="#0"/>"##));
    assert!(about.contains(r##"<use href="#1"/>"##));
    assert!(about.starts_with("<html><body><svg xmlns="));

    let index = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert!(index.contains(r##"<use href="#0"/>"##));
    assert!(index.contains("<body class=\"home\"><svg xmlns="));

    let manifest: SpriteManifestSummary = serde_json::from_str(&artifacts.manifest_json).unwrap();
    assert_eq!(manifest.symbols[0].source_path, "icons/star.svg");
    assert_eq!(manifest.symbols[1].source_path, "icons/dot.svg");
    assert_eq!(manifest.pages, vec!["about/index.html", "index.html"]);
    assert!(artifacts.manifest_path.exists());
  }

  #[tokio::test]
  async fn excluded_and_missing_svgs_stay_as_references() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "src/icons/star.svg", STAR);
    write(root, "src/vendor/logo.svg", DOT);
    write(
      root,
      "src/index.html",
      r#"<body><use href="vendor/logo.svg"/><use href="icons/missing.svg"/><use href="icons/star.svg"/></body>"#,
    );

    let config = SpriteConfig::default();
    let builder = SpriteBuilder::new(SpriteBuildContext {
      root,
      config: &config,
      keep_going: false,
    });
    let selection = AssetSelection::new(Vec::new(), vec!["vendor".into()]);
    let artifacts = builder.build(&selection).await.unwrap();

    let index = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert!(index.contains(r#"<use href="vendor/logo.svg"/>"#));
    assert!(index.contains(r#"<use href="icons/missing.svg"/>"#));
    assert!(index.contains(r##"<use href="#0"/>"##));
    assert_eq!(artifacts.symbols, 1);
  }

  #[tokio::test]
  async fn composition_failures_abort_unless_keep_going() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "src/icons/broken.svg", "<div>not an svg</div>");
    write(root, "src/index.html", r#"<body><use href="icons/broken.svg"/></body>"#);

    let config = SpriteConfig::default();
    let strict = SpriteBuilder::new(SpriteBuildContext {
      root,
      config: &config,
      keep_going: false,
    });
    let err = strict.build(&AssetSelection::default()).await.unwrap_err();
    assert!(format!("{err:#}").contains("broken.svg"));

    let lenient = SpriteBuilder::new(SpriteBuildContext {
      root,
      config: &config,
      keep_going: true,
    });
    let artifacts = lenient.build(&AssetSelection::default()).await.unwrap();
    assert_eq!(artifacts.compositions, 0);
    let index = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert_eq!(index, r#"<body><use href="icons/broken.svg"/></body>"#);
  }

  #[tokio::test]
  async fn builds_pages_in_the_project_root() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "icons/star.svg", STAR);
    write(root, "index.html", r#"<body><use href="./icons/star.svg"/></body>"#);
    write(root, "dist/stale.html", "<body>old output</body>");

    let config = SpriteConfig {
      source_dir: ".".into(),
      ..SpriteConfig::default()
    };
    let builder = SpriteBuilder::new(SpriteBuildContext {
      root,
      config: &config,
      keep_going: false,
    });
    let artifacts = builder.build(&AssetSelection::default()).await.unwrap();

    assert_eq!(artifacts.pages, vec![root.join("dist/index.html")]);
    let manifest: SpriteManifestSummary = serde_json::from_str(&artifacts.manifest_json).unwrap();
    assert_eq!(manifest.pages, vec!["index.html"]);
    assert_eq!(manifest.symbols[0].source_path, "icons/star.svg");
    let index = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert!(index.contains(r##"<use href="#0"/>"##));
  }

  #[tokio::test]
  async fn svg_links_outside_use_elements_are_not_bundled() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "src/favicon.svg", DOT);
    write(root, "src/logo.svg", STAR);
    let page = r#"<head><link rel="icon" href="favicon.svg"></head><body><a href="logo.svg">download</a></body>"#;
    write(root, "src/index.html", page);

    let config = SpriteConfig::default();
    let builder = SpriteBuilder::new(SpriteBuildContext {
      root,
      config: &config,
      keep_going: false,
    });
    let artifacts = builder.build(&AssetSelection::default()).await.unwrap();

    assert_eq!(artifacts.symbols, 0);
    let index = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert!(index.starts_with(r#"<head><link rel="icon" href="favicon.svg"></head><body><svg xmlns="#));
    assert!(index.ends_with(r#"</svg><a href="logo.svg">download</a></body>"#));
  }

  #[tokio::test]
  async fn missing_source_dir_is_an_error() {
    let temp = tempdir().unwrap();
    let config = SpriteConfig::default();
    let builder = SpriteBuilder::new(SpriteBuildContext {
      root: temp.path(),
      config: &config,
      keep_going: false,
    });
    assert!(builder.build(&AssetSelection::default()).await.is_err());
  }
}
