//! Plain-text rendering of notice bodies.
//!
//! Bodies come from a rich-text editor that emits a small HTML subset
//! (bold, italic, underline, alignment wrappers, lists, line breaks).
//! Older notices are plain text. The terminal shows both as text.

use regex::Regex;
use std::sync::OnceLock;

fn tag_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

fn unsafe_block_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?is)<(script|iframe|style)[^>]*>.*?</(script|iframe|style)\s*>").expect("valid regex")
  })
}

fn url_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"{}|\\^`\[\]]+"#).expect("valid regex")
  })
}

/// Whether the body contains markup
pub fn is_html(body: &str) -> bool {
  tag_re().is_match(body)
}

/// List context while walking the markup
enum ListKind {
  Bullet,
  Numbered(usize),
}

/// Render a body as plain text with list markers and paragraph breaks.
pub fn to_plain_text(body: &str) -> String {
  if !is_html(body) {
    return body.trim().to_string();
  }

  let cleaned = unsafe_block_re().replace_all(body, "");
  let mut out = String::with_capacity(cleaned.len());
  let mut lists: Vec<ListKind> = Vec::new();
  let mut last = 0;

  for tag in tag_re().find_iter(&cleaned) {
    out.push_str(&decode_entities(&cleaned[last..tag.start()]));
    last = tag.end();

    let inner = tag.as_str().trim_start_matches('<').trim_end_matches('>');
    let closing = inner.starts_with('/');
    let name: String = inner
      .trim_start_matches('/')
      .chars()
      .take_while(|c| c.is_ascii_alphanumeric())
      .collect::<String>()
      .to_lowercase();

    match (name.as_str(), closing) {
      ("br", _) => out.push('\n'),
      ("p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote", _) => {
        newline(&mut out)
      }
      ("ul", false) => {
        newline(&mut out);
        lists.push(ListKind::Bullet);
      }
      ("ol", false) => {
        newline(&mut out);
        lists.push(ListKind::Numbered(0));
      }
      ("ul" | "ol", true) => {
        lists.pop();
        newline(&mut out);
      }
      ("li", false) => {
        newline(&mut out);
        let depth = lists.len().saturating_sub(1);
        out.push_str(&"  ".repeat(depth));
        match lists.last_mut() {
          Some(ListKind::Numbered(n)) => {
            *n += 1;
            out.push_str(&format!("{}. ", n));
          }
          _ => out.push_str("• "),
        }
      }
      _ => {}
    }
  }
  out.push_str(&decode_entities(&cleaned[last..]));

  tidy(&out)
}

/// Start a new line unless already at one
fn newline(out: &mut String) {
  if !out.is_empty() && !out.ends_with('\n') {
    out.push('\n');
  }
}

fn decode_entities(text: &str) -> String {
  text
    .replace("&nbsp;", " ")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&#39;", "'")
    .replace("&apos;", "'")
    .replace("&amp;", "&")
}

/// Trim trailing spaces per line and collapse runs of blank lines
fn tidy(text: &str) -> String {
  let mut lines: Vec<&str> = Vec::new();
  let mut blank_run = 0;
  for line in text.lines().map(str::trim_end) {
    if line.trim().is_empty() {
      blank_run += 1;
      if blank_run > 1 {
        continue;
      }
    } else {
      blank_run = 0;
    }
    lines.push(line);
  }
  lines.join("\n").trim().to_string()
}

/// Links mentioned in the body, normalized to include a scheme
pub fn extract_links(body: &str) -> Vec<String> {
  let text = to_plain_text(body);
  let mut links: Vec<String> = url_re()
    .find_iter(&text)
    .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ';']))
    .map(|url| {
      if url.to_lowercase().starts_with("http") {
        url.to_string()
      } else {
        format!("https://{}", url)
      }
    })
    .collect();
  links.dedup();
  links
}
