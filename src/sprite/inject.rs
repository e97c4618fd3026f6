//! Splicing the composed sprite into emitted HTML.

/// Opening marker of the container the sprite is placed into.
pub const DEFAULT_MARKER: &str = "<body";

/// Insert `sprite` right after the opening `<body ...>` tag of `html`.
pub fn inject_sprite(html: &str, sprite: &str) -> String {
  inject_sprite_at(html, sprite, DEFAULT_MARKER)
}

/// Insert `sprite` right after the first tag opened by `marker`.
///
/// This is a substring search, not a markup parser: the first `>` after the marker ends the
/// tag, even when it sits inside a quoted attribute value. Pages without the marker are
/// returned unchanged.
pub fn inject_sprite_at(html: &str, sprite: &str, marker: &str) -> String {
  let Some(start) = html.find(marker) else {
    return html.to_string();
  };
  let Some(close) = html[start..].find('>') else {
    return html.to_string();
  };

  let split = start + close + 1;
  let mut output = String::with_capacity(html.len() + sprite.len());
  output.push_str(&html[..split]);
  output.push_str(sprite);
  output.push_str(&html[split..]);
  output
}
