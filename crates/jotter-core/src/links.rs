//! Link extraction from note content.
//!
//! A link is any maximal run of non-whitespace characters starting with an
//! `http://` or `https://` scheme (case-insensitive), except loopback URLs:
//! a host of exactly `127.0.0.1` supports local testing and is never treated
//! as an attachable link. Extraction feeds two consumers: hyperlink
//! rendering spans and the synthetic `"link"` attachment reconciled on save.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Attachment;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").unwrap());

/// Extract attachable URLs from note content, in order of appearance.
///
/// # Examples
///
/// ```
/// use jotter_core::extract_links;
///
/// let content = "see https://example.com/a and http://127.0.0.1:3000/dev";
/// assert_eq!(extract_links(content), vec!["https://example.com/a"]);
/// ```
pub fn extract_links(content: &str) -> Vec<&str> {
    URL_PATTERN
        .find_iter(content)
        .map(|m| m.as_str())
        .filter(|url| is_attachable(url))
        .collect()
}

/// A rendering span: either plain text or an attachable link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    Link(&'a str),
}

impl<'a> Span<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Span::Text(s) | Span::Link(s) => s,
        }
    }
}

/// Split content into alternating plain/link spans, in original order.
///
/// No characters are lost or duplicated: concatenating the spans reproduces
/// the input exactly. Loopback URLs stay inside plain-text spans.
pub fn render_spans(content: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    for m in URL_PATTERN.find_iter(content) {
        if !is_attachable(m.as_str()) {
            continue;
        }
        if m.start() > cursor {
            spans.push(Span::Text(&content[cursor..m.start()]));
        }
        spans.push(Span::Link(m.as_str()));
        cursor = m.end();
    }
    if cursor < content.len() {
        spans.push(Span::Text(&content[cursor..]));
    }
    spans
}

/// Reconcile the synthetic link attachment with the current content.
///
/// One or more extracted links: append a link attachment for the first match
/// unless one with that exact URL already exists. Zero links: remove every
/// link attachment. Only the first link is ever attached; later links render
/// but do not attach.
pub fn sync_link_attachment(content: &str, attachments: &mut Vec<Attachment>) {
    match extract_links(content).first() {
        Some(first) => {
            if !attachments.iter().any(|a| a.is_link() && a.url == *first) {
                attachments.push(Attachment::link(first));
            }
        }
        None => attachments.retain(|a| !a.is_link()),
    }
}

fn is_attachable(url: &str) -> bool {
    host_of(url) != Some("127.0.0.1")
}

/// The authority host of a matched URL: everything after the scheme up to
/// the first `/`, `?`, or `#`, minus credentials and port.
fn host_of(url: &str) -> Option<&str> {
    let rest = url.splitn(2, "://").nth(1)?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    host_port.split(':').next()
}
