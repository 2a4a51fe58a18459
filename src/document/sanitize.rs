//! Rich text boundary: allow-list HTML sanitization
//!
//! Free-text fields store HTML. Anything entering the document goes through
//! [`sanitize_html`], which keeps only simple formatting tags.

use serde::{Deserialize, Serialize};

/// Tags that survive sanitization (attributes are always removed)
const ALLOWED_TAGS: &[&str] = &["b", "i", "u", "ul", "ol", "li", "br"];

/// Elements dropped together with their content
const DROPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Sanitized HTML. Only constructible through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RichText(String);

impl RichText {
    pub fn new(raw: &str) -> Self {
        Self(sanitize_html(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text content without markup
    pub fn plain_text(&self) -> String {
        strip_tags(&self.0)
    }
}

impl From<String> for RichText {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<RichText> for String {
    fn from(text: RichText) -> Self {
        text.0
    }
}

struct Tag<'a> {
    name: String,
    closing: bool,
    self_closing: bool,
    /// Remaining input after the closing `>`
    rest: &'a str,
}

/// Parse a tag at the start of `input` (which begins with `<`)
fn parse_tag(input: &str) -> Option<Tag<'_>> {
    let body = &input[1..];
    let (closing, body) = match body.strip_prefix('/') {
        Some(stripped) => (true, stripped),
        None => (false, body),
    };
    if !body.as_bytes().first().is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }

    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }

    let end = body.find('>')?;
    if end < name_len {
        return None;
    }

    Some(Tag {
        name: body[..name_len].to_ascii_lowercase(),
        closing,
        self_closing: body[..end].ends_with('/'),
        rest: &body[end + 1..],
    })
}

/// Keep only allow-listed tags, stripped of attributes
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    // Name of the dropped element whose content is being skipped
    let mut skipping: Option<String> = None;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            if skipping.is_none() {
                out.push_str(rest);
            }
            break;
        };

        if skipping.is_none() {
            out.push_str(&rest[..lt]);
        }
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = match after.find("-->") {
                Some(end) => &after[end + 3..],
                None => "",
            };
            continue;
        }

        let Some(tag) = parse_tag(rest) else {
            if skipping.is_none() {
                out.push_str("&lt;");
            }
            rest = &rest[1..];
            continue;
        };
        rest = tag.rest;

        if let Some(name) = &skipping {
            if tag.closing && *name == tag.name {
                skipping = None;
            }
            continue;
        }

        if DROPPED_ELEMENTS.contains(&tag.name.as_str()) {
            if !tag.closing && !tag.self_closing {
                skipping = Some(tag.name);
            }
            continue;
        }

        if !ALLOWED_TAGS.contains(&tag.name.as_str()) {
            continue;
        }

        if tag.name == "br" {
            if !tag.closing {
                out.push_str("<br>");
            }
        } else if tag.closing {
            out.push_str("</");
            out.push_str(&tag.name);
            out.push('>');
        } else {
            out.push('<');
            out.push_str(&tag.name);
            out.push('>');
        }
    }

    out
}

/// Convert a plain-text paste to safe HTML, keeping line breaks
pub fn sanitize_paste(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Remove all markup, leaving text content
pub fn strip_tags(html: &str) -> String {
    let clean = sanitize_html(html);
    let mut text = String::with_capacity(clean.len());
    let mut in_tag = false;
    for c in clean.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
