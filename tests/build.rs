use std::fs;
use std::path::Path;

use svg_sprite_bundler::config::SymbolIdStrategy;
use svg_sprite_bundler::models::SpriteManifestSummary;
use svg_sprite_bundler::{AssetSelection, SpriteBuildContext, SpriteBuilder, SpriteConfig};
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

#[tokio::test]
async fn file_stem_ids_and_configured_output() {
  let temp = tempdir().unwrap();
  let root = temp.path();
  write(
    root,
    "sprite.config.json",
    r#"{"source_dir": "site", "output_dir": "public", "symbol_id": "file-stem", "symbol_id_prefix": "icon-", "sprite_class": "sprite"}"#,
  );
  write(root, "site/icons/Arrow Left.svg", "<svg viewBox=\"0 0 16 16\"><path d=\"M0 8h16\"/></svg>");
  write(root, "site/icons/close.svg", "<svg viewBox=\"0 0 16 16\"><path d=\"M0 0l16 16\"/></svg>");
  write(
    root,
    "site/a.html",
    r#"<!doctype html><html><head><title>a</title></head><body><svg><use href="icons/Arrow Left.svg"/></svg></body></html>"#,
  );
  write(
    root,
    "site/b.html",
    r#"<!doctype html><html><head><title>b</title></head><body><svg><use href="icons/close.svg"/></svg><svg><use href="icons/Arrow Left.svg"/></svg></body></html>"#,
  );
  write(root, "site/fragment.html", "<p>no container here</p>");

  let config = SpriteConfig::discover(root);
  assert_eq!(config.symbol_id, SymbolIdStrategy::FileStem);

  let artifacts = SpriteBuilder::new(SpriteBuildContext {
    root,
    config: &config,
    keep_going: false,
  })
  .build(&AssetSelection::default())
  .await
  .unwrap();

  // a.html composes, b.html adds close.svg and recomposes, fragment.html reuses.
  assert_eq!(artifacts.compositions, 2);
  assert_eq!(artifacts.symbols, 2);

  let a = fs::read_to_string(root.join("public/a.html")).unwrap();
  assert!(a.contains("<body><svg xmlns=\"http://www.w3.org/2000/svg\""));
  assert!(a.contains(" class=\"sprite\""));
  assert!(a.contains("<symbol id=\"icon-arrow-left\" viewBox=\"0 0 16 16\">"));
  assert!(!a.contains("icon-close"));
  assert!(a.contains(r##"<use href="#icon-arrow-left"/>"##));

  let b = fs::read_to_string(root.join("public/b.html")).unwrap();
  assert!(b.contains("<symbol id=\"icon-close\""));
  assert!(b.find("id=\"icon-arrow-left\"").unwrap() < b.find("id=\"icon-close\"").unwrap());

  let fragment = fs::read_to_string(root.join("public/fragment.html")).unwrap();
  assert_eq!(fragment, "<p>no container here</p>");

  let manifest: SpriteManifestSummary =
    serde_json::from_str(&fs::read_to_string(root.join("public/sprite-manifest.json")).unwrap())
      .unwrap();
  let ids: Vec<&str> = manifest.symbols.iter().map(|symbol| symbol.id.as_str()).collect();
  assert_eq!(ids, vec!["icon-arrow-left", "icon-close"]);
}

#[tokio::test]
async fn rebuilding_overwrites_previous_output() {
  let temp = tempdir().unwrap();
  let root = temp.path();
  write(root, "src/icons/dot.svg", "<svg viewBox=\"0 0 2 2\"><circle r=\"1\"/></svg>");
  write(root, "src/index.html", r#"<body><use href="icons/dot.svg"/></body>"#);

  let config = SpriteConfig::default();
  let builder = SpriteBuilder::new(SpriteBuildContext {
    root,
    config: &config,
    keep_going: false,
  });
  builder.build(&AssetSelection::default()).await.unwrap();
  builder.build(&AssetSelection::default()).await.unwrap();

  let index = fs::read_to_string(root.join("dist/index.html")).unwrap();
  assert_eq!(index.matches("<symbol").count(), 1);
  assert!(index.contains(r##"<use href="#0"/>"##));
}
