//! Locating SVG module references inside HTML pages.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn use_tag_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?is)<use\b[^>]*>").expect("invalid use tag regex"))
}

fn svg_href_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r##"(?i)(\s(?:xlink:)?href\s*=\s*)(?:"([^"#]+\.svg)"|'([^'#]+\.svg)')"##)
      .expect("invalid svg href regex")
  })
}

/// The quote character and value of an `href` match, whichever quote style it used.
fn href_value<'h>(caps: &Captures<'h>) -> Option<(char, &'h str)> {
  caps
    .get(2)
    .map(|value| ('"', value.as_str()))
    .or_else(|| caps.get(3).map(|value| ('\'', value.as_str())))
}

fn external_reference_patterns() -> &'static [Regex] {
  static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
  PATTERNS
    .get_or_init(|| {
      vec![
        Regex::new(r"(?i)^[a-z][a-z0-9+.-]*:").expect("invalid scheme regex"),
        Regex::new(r"^//").expect("invalid protocol-relative regex"),
      ]
    })
    .as_slice()
}

/// Whether `value` points outside the project and cannot be bundled.
pub fn is_external_reference(value: &str) -> bool {
  external_reference_patterns()
    .iter()
    .any(|pattern| pattern.is_match(value))
}

/// Local `.svg` references of `<use>` elements in `html`, in order of first appearance.
///
/// Both `href` and `xlink:href` are read, in either quote style. Other elements linking an
/// SVG file (`<link rel="icon">`, `<a>`, `<img>`) are not sprite modules and are ignored.
pub fn collect_svg_references(html: &str) -> Vec<String> {
  let mut references: Vec<String> = Vec::new();
  for tag in use_tag_pattern().find_iter(html) {
    for caps in svg_href_pattern().captures_iter(tag.as_str()) {
      let Some((_, value)) = href_value(&caps) else {
        continue;
      };
      if is_external_reference(value) || references.iter().any(|seen| seen == value) {
        continue;
      }
      references.push(value.to_string());
    }
  }
  references
}

/// Replace each `<use>` reference found in `resolved` with its symbol href.
pub fn rewrite_svg_references(html: &str, resolved: &BTreeMap<String, String>) -> String {
  use_tag_pattern()
    .replace_all(html, |tag: &Captures| {
      svg_href_pattern()
        .replace_all(&tag[0], |caps: &Captures| match href_value(caps) {
          Some((quote, value)) => match resolved.get(value) {
            Some(href) => format!("{}{quote}{href}{quote}", &caps[1]),
            None => caps[0].to_string(),
          },
          None => caps[0].to_string(),
        })
        .into_owned()
    })
    .into_owned()
}
