//! Pure message-content extraction: MIME walk, HTML to text, truncation.
//! Nothing in here performs I/O and nothing fails outward; a message that
//! cannot be decoded degrades to the no-content placeholder.

use std::collections::HashSet;

use chrono::{DateTime, Local, TimeZone};
use mailparse::{MailHeaderMap, ParsedMail};

use mailwatch_core::MessageRecord;

pub const NO_CONTENT_PLACEHOLDER: &str = "(no text content)";
const TRUNCATION_MARKER: &str = "...";

/// Decodes one raw RFC 822 message into a subject, a single-line body
/// excerpt, and the parsed Date header. Both text fields are capped at
/// `max_chars` characters with a `...` marker when cut.
pub fn extract(raw: &[u8], max_chars: usize) -> MessageRecord {
    let parsed = match mailparse::parse_mail(raw) {
        Ok(parsed) => parsed,
        Err(_) => {
            return MessageRecord {
                received_at: None,
                subject: String::new(),
                body_excerpt: NO_CONTENT_PLACEHOLDER.to_string(),
            };
        }
    };

    let subject = truncate(&decode_subject(&parsed), max_chars);
    let received_at = parse_received_at(&parsed);
    let body_excerpt = match select_body(&parsed) {
        Some(text) => normalize_excerpt(&text, max_chars),
        None => NO_CONTENT_PLACEHOLDER.to_string(),
    };

    MessageRecord {
        received_at,
        subject,
        body_excerpt,
    }
}

fn decode_subject(parsed: &ParsedMail) -> String {
    parsed
        .headers
        .get_first_value("Subject")
        .unwrap_or_default()
}

fn parse_received_at(parsed: &ParsedMail) -> Option<DateTime<Local>> {
    let date = parsed.headers.get_first_value("Date")?;
    let epoch = mailparse::dateparse(&date).ok()?;
    Local.timestamp_opt(epoch, 0).single()
}

/// First `text/plain` leaf wins; otherwise the first `text/html` leaf is
/// converted. A part whose transfer decoding fails is skipped.
fn select_body(parsed: &ParsedMail) -> Option<String> {
    let mut text_plain: Option<String> = None;
    let mut text_html: Option<String> = None;

    walk_parts(parsed, &mut |part| {
        if !part.subparts.is_empty() {
            return;
        }
        let ctype = part.ctype.mimetype.to_lowercase();
        if ctype == "text/plain" && text_plain.is_none() {
            if let Ok(body) = part.get_body() {
                text_plain = Some(body);
            }
        }
        if ctype == "text/html" && text_html.is_none() {
            if let Ok(body) = part.get_body() {
                text_html = Some(body);
            }
        }
    });

    if text_plain.is_some() {
        return text_plain;
    }
    text_html.map(|html| html_to_text(&html))
}

fn walk_parts<F>(parsed: &ParsedMail, cb: &mut F)
where
    F: FnMut(&ParsedMail),
{
    cb(parsed);
    for part in &parsed.subparts {
        walk_parts(part, cb);
    }
}

/// Strips markup down to plain text: `<style>`/`<script>` disappear with
/// their content, every other tag is removed, entities are decoded, and
/// whitespace runs collapse to single spaces.
fn html_to_text(html: &str) -> String {
    let mut builder = ammonia::Builder::default();
    builder.tags(HashSet::new());
    let stripped = builder.clean(html).to_string();
    let decoded = html_escape::decode_html_entities(&stripped);
    collapse_whitespace(&decoded)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for part in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

fn normalize_excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return NO_CONTENT_PLACEHOLDER.to_string();
    }
    truncate(&collapsed, max_chars)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
