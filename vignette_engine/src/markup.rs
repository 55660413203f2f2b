//! Markdown rendering for situation content and link text.
//!
//! Content is rendered as CommonMark with typographic punctuation ("smart
//! quotes") and raw HTML passthrough, so authors can embed anchors and spans
//! directly in their prose.
//!
//! Two entry points:
//! - [`render`] produces block HTML (paragraphs, headings, lists).
//! - [`render_inline`] produces a fragment without the wrapping paragraph,
//!   for text that is spliced into an existing element.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_SMART_PUNCTUATION);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts
}

/// Render markdown as block-level HTML.
pub fn render(text: &str) -> String {
    let parser = Parser::new_ext(text, options());
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render markdown as an inline HTML fragment.
///
/// Paragraph tags are dropped and the caller's surrounding whitespace is kept,
/// so `" work"` inserted after `"links"` still reads `"links work"`.
pub fn render_inline(text: &str) -> String {
    let body = text.trim();
    if body.is_empty() {
        return text.to_string();
    }
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let parser = Parser::new_ext(body, options())
        .filter(|event| !matches!(event, Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph)));
    let mut out = String::with_capacity(body.len());
    html::push_html(&mut out, parser);

    format!("{lead}{}{trail}", out.trim_end_matches('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_wraps_paragraphs() {
        assert_eq!(
            render("This is the content of the *testing* situation."),
            "<p>This is the content of the <em>testing</em> situation.</p>\n"
        );
    }

    #[test]
    fn render_supports_headings() {
        assert_eq!(render("# Markdown Support"), "<h1>Markdown Support</h1>\n");
    }

    #[test]
    fn render_uses_smart_quotes() {
        assert_eq!(render("\"Hi\""), "<p>\u{201c}Hi\u{201d}</p>\n");
    }

    #[test]
    fn render_passes_inline_html_through() {
        let out = render("<a class=\"once writer\" href=\"./_writer_more\">more</a> please");
        assert_eq!(
            out,
            "<p><a class=\"once writer\" href=\"./_writer_more\">more</a> please</p>\n"
        );
    }

    #[test]
    fn render_inline_drops_paragraph() {
        assert_eq!(render_inline("this *is* it"), "this <em>is</em> it");
    }

    #[test]
    fn render_inline_keeps_surrounding_whitespace() {
        assert_eq!(render_inline(" work"), " work");
        assert_eq!(render_inline("   "), "   ");
    }
}
