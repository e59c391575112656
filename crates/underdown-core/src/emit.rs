use crate::parser::parse;
use crate::tag::{STANDARD_TAGS, TagState, TagTable};
use crate::token::{TagMarker, Token};
use ammonia::Builder;
use std::collections::HashSet;

/// Renders a token stream to an HTML fragment.
///
/// Total over any caller-built stream: a kind missing from `tags` renders
/// no markup and offsets past the end of a word are clamped. Tokens are
/// joined with single spaces, newline tokens pass through bare, and the
/// assembled fragment is trimmed.
pub fn render(tokens: &[Token], tags: &TagTable) -> String {
    let mut out = String::new();
    for token in tokens {
        if token.markers.is_empty() {
            out.push_str(&token.content);
        } else {
            render_marked(&mut out, token, tags);
        }
        if token.content != "\n" {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

fn render_marked(out: &mut String, token: &Token, tags: &TagTable) {
    let chars: Vec<char> = token.content.chars().collect();
    let mut markers: Vec<&TagMarker> = token.markers.iter().collect();
    // Stable sort: offset ties keep discovery order.
    markers.sort_by_key(|marker| marker.offset);

    let mut cursor = 0;
    for marker in markers {
        let upto = marker.offset.min(chars.len());
        if upto > cursor {
            out.extend(&chars[cursor..upto]);
        }
        if let Some(element) = tags.html_element(marker.kind) {
            match marker.state {
                TagState::Open => {
                    out.push('<');
                    out.push_str(element);
                    out.push('>');
                }
                TagState::Close => {
                    out.push_str("</");
                    out.push_str(element);
                    out.push('>');
                }
            }
        }
        let past_delimiter = (marker.offset + marker.kind.delimiter_width()).min(chars.len());
        cursor = cursor.max(past_delimiter);
    }
    out.extend(&chars[cursor..]);
}

/// Converts a document straight to an HTML fragment with the standard tag
/// table. Header lines open an `<h1>` that nothing closes; callers that
/// need balanced headings must post-process (or sanitize, which balances).
pub fn convert_to_html(source: &str) -> String {
    render(&parse(source), &STANDARD_TAGS)
}

/// Converts a document and sanitizes the result, keeping only the elements
/// the dialect can itself produce. Stray markup in the input text is
/// escaped or stripped and unbalanced tags are closed.
pub fn convert_to_html_sanitized(source: &str) -> String {
    let raw = convert_to_html(source);

    let tags: HashSet<&'static str> = ["b", "i", "span", "h1"].iter().copied().collect();

    Builder::new()
        .tags(tags)
        .generic_attributes(HashSet::new())
        .clean(&raw)
        .to_string()
}
