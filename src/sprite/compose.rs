//! Composition of registered assets into a single sprite document.

use std::path::PathBuf;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Captures, Regex};

use crate::models::AssetRecord;

/// Errors raised while composing the sprite document.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
  /// The asset has no `<svg>` root element.
  #[error("no <svg> root element in {}", path.display())]
  MissingRoot {
    /// Offending asset.
    path: PathBuf,
  },
  /// The root element is never closed.
  #[error("unterminated <svg> root element in {}", path.display())]
  Unterminated {
    /// Offending asset.
    path: PathBuf,
  },
  /// Failure reported by a custom composer.
  #[error("{0}")]
  Other(String),
}

/// Turns the registry contents into one document.
///
/// Composition may suspend; the state it runs against is a snapshot taken when the
/// emission started.
#[async_trait(?Send)]
pub trait SpriteComposer {
  /// Compose `records` (in registry order) into a sprite document.
  async fn compose(&self, records: &[AssetRecord]) -> Result<String, ComposeError>;
}

/// Default composer wrapping each asset in a `<symbol>` inside one hidden `<svg>`.
#[derive(Debug, Clone, Default)]
pub struct SymbolSpriteComposer {
  /// Optional `class` attribute on the outer container.
  pub class_name: Option<String>,
}

#[async_trait(?Send)]
impl SpriteComposer for SymbolSpriteComposer {
  async fn compose(&self, records: &[AssetRecord]) -> Result<String, ComposeError> {
    let mut symbols = Vec::with_capacity(records.len());
    for record in records {
      symbols.push(render_symbol(record)?);
    }

    let class_attr = match self.class_name.as_deref() {
      Some(class) if !class.is_empty() => format!(" class=\"{}\"", escape_attr(class)),
      _ => String::new(),
    };

    Ok(format!(
      "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"{class_attr} style=\"position:absolute;width:0;height:0\" aria-hidden=\"true\">{}</svg>",
      symbols.concat()
    ))
  }
}

fn svg_open_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?is)<svg\b([^>]*)>").expect("invalid svg root regex"))
}

fn comment_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid comment regex"))
}

fn attribute_pattern(name: &str) -> Regex {
  Regex::new(&format!(
    r#"(?i)(?:^|\s){}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    regex::escape(name)
  ))
  .expect("invalid attribute regex")
}

fn carried_attributes() -> &'static [(&'static str, Regex)] {
  static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
  PATTERNS
    .get_or_init(|| {
      ["viewBox", "preserveAspectRatio"]
        .into_iter()
        .map(|name| (name, attribute_pattern(name)))
        .collect()
    })
    .as_slice()
}

/// Blank out comments so markup inside them is never taken for the root.
///
/// Replacement keeps byte offsets, so positions found in the result index `content` too.
fn mask_comments(content: &str) -> String {
  comment_pattern()
    .replace_all(content, |caps: &Captures| " ".repeat(caps[0].len()))
    .into_owned()
}

/// Render one asset as a `<symbol>` element.
fn render_symbol(record: &AssetRecord) -> Result<String, ComposeError> {
  let content = record.raw_content.as_str();
  let masked = mask_comments(content);
  let captures = svg_open_pattern()
    .captures(&masked)
    .ok_or_else(|| ComposeError::MissingRoot {
      path: record.source_path.clone(),
    })?;
  let (Some(open), Some(attrs)) = (captures.get(0), captures.get(1)) else {
    return Err(ComposeError::MissingRoot {
      path: record.source_path.clone(),
    });
  };

  let attrs = attrs.as_str();
  let inner = if attrs.trim_end().ends_with('/') {
    ""
  } else {
    let close = masked
      .to_ascii_lowercase()
      .rfind("</svg")
      .filter(|index| *index >= open.end())
      .ok_or_else(|| ComposeError::Unterminated {
        path: record.source_path.clone(),
      })?;
    &content[open.end()..close]
  };

  let mut symbol_attrs = format!(" id=\"{}\"", escape_attr(&record.id));
  for (name, pattern) in carried_attributes() {
    let value = pattern
      .captures(attrs)
      .and_then(|caps| caps.get(1).or_else(|| caps.get(2)));
    if let Some(value) = value {
      symbol_attrs.push_str(&format!(" {name}=\"{}\"", escape_attr(value.as_str())));
    }
  }

  Ok(format!("<symbol{symbol_attrs}>{}</symbol>", inner.trim()))
}

fn escape_attr(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('"', "&quot;")
    .replace('<', "&lt;")
}
