use std::io::Cursor;

use html2text::render::TrivialDecorator;

/// Wrap width handed to html2text; lines are re-joined afterwards.
const RENDER_WIDTH: usize = 1000;

/// Visible text of a rendered page as one single-spaced line.
pub fn extract_visible_text(markup: &str) -> String {
    let mut html = markup.to_string();
    for tag in ["script", "style", "noscript"] {
        html = strip_tag_blocks(&html, tag);
    }
    // No markdown decoration, link footnotes or table borders: text nodes only.
    let rendered = html2text::config::with_decorator(TrivialDecorator::new())
        .raw_mode(true)
        .string_from_read(Cursor::new(html.as_bytes()), RENDER_WIDTH)
        .unwrap_or_else(|_| html.clone());
    collapse_whitespace(&rendered)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `<tag ...>...</tag>` blocks, ASCII-case-insensitively.
/// An unclosed block is left in place.
fn strip_tag_blocks(html: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}>", tag);

    let mut out = String::with_capacity(html.len());
    let mut i = 0usize;
    while let Some(rel_start) = lower[i..].find(&open_pat) {
        let start = i + rel_start;
        let after_open = start + open_pat.len();
        // `<styles>` or `<scripted>` are other tags.
        let boundary = lower[after_open..]
            .chars()
            .next()
            .map_or(true, |c| c == '>' || c == '/' || c.is_ascii_whitespace());
        if !boundary {
            out.push_str(&html[i..after_open]);
            i = after_open;
            continue;
        }
        let Some(rel_end) = lower[after_open..].find(&close_pat) else {
            break;
        };
        out.push_str(&html[i..start]);
        i = after_open + rel_end + close_pat.len();
    }
    out.push_str(&html[i..]);
    out
}
