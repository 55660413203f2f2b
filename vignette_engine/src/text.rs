//! Text helpers applied to authored content before and after rendering.
//!
//! Authored text is usually written as an indented multi-line literal inside
//! code or a story file. [`normalize_tabs`] removes the shared indentation so
//! the markdown renderer doesn't mistake the whole passage for a code block.
//! [`fade`] and [`span_wrap`] decorate rendered HTML fragments for insertion.

use std::sync::LazyLock;

use regex::Regex;

/// Strip the smallest leading-whitespace run shared by all non-blank lines.
///
/// Tabs and spaces each count as one character. Blank lines (empty or
/// whitespace only) are ignored when measuring, so the result is stable under
/// repeated application; a text made only of blank lines comes back as is.
pub fn normalize_tabs(text: &str) -> String {
    let Some(indent) = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .min()
    else {
        return text.to_string();
    };

    if indent == 0 {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| strip_leading_whitespace(line, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of leading whitespace characters (not bytes) in `line`.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn strip_leading_whitespace(line: &str, count: usize) -> &str {
    let mut rest = line;
    for _ in 0..count {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c.is_whitespace() => rest = chars.as_str(),
            _ => break,
        }
    }
    rest
}

/// Wrap an inline HTML fragment so it forms a single element.
pub fn span_wrap(html: &str) -> String {
    format!("<span>{html}</span>")
}

pub(crate) static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*)>").expect("tag pattern is valid"));
pub(crate) static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\sclass\s*=\s*")([^"]*)""#).expect("class pattern is valid"));

/// Elements that never take a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Add the `fade` class to every top-level element of an HTML fragment.
///
/// Hosts use the class to animate freshly inserted text. Bare text at the top
/// level is left alone.
pub fn fade(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 16);
    let mut depth = 0usize;
    let mut last = 0;

    for caps in TAG.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        let closing = !caps[1].is_empty();
        let name = &caps[2];
        let attrs = &caps[3];
        let self_closing = attrs.ends_with('/') || is_void(name);

        if closing {
            depth = depth.saturating_sub(1);
            continue;
        }

        if depth == 0 {
            out.push_str(&html[last..whole.start()]);
            out.push_str(&add_class(name, attrs, "fade"));
            last = whole.end();
        }
        if !self_closing {
            depth += 1;
        }
    }

    out.push_str(&html[last..]);
    out
}

/// Rebuild an opening tag with `class` appended to its class list.
pub(crate) fn add_class(name: &str, attrs: &str, class: &str) -> String {
    if CLASS_ATTR.is_match(attrs) {
        let attrs = CLASS_ATTR.replace(attrs, |caps: &regex::Captures| {
            let existing = caps[2].trim();
            if existing.is_empty() {
                format!("{}{class}\"", &caps[1])
            } else {
                format!("{}{existing} {class}\"", &caps[1])
            }
        });
        format!("<{name}{attrs}>")
    } else {
        format!("<{name} class=\"{class}\"{attrs}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_smallest_indent() {
        assert_eq!(normalize_tabs("    a\n      b"), "a\n  b");
    }

    #[test]
    fn normalize_ignores_blank_lines() {
        let text = "\n        Hello\n\n          there\n      ";
        assert_eq!(normalize_tabs(text), "\nHello\n\n  there\n");
    }

    #[test]
    fn normalize_leaves_unindented_text_alone() {
        assert_eq!(normalize_tabs("a\n    b"), "a\n    b");
    }

    #[test]
    fn normalize_counts_tabs_as_one_character() {
        assert_eq!(normalize_tabs("\ta\n    b"), "a\n   b");
    }

    #[test]
    fn normalize_returns_blank_text_unchanged() {
        assert_eq!(normalize_tabs(""), "");
        assert_eq!(normalize_tabs("\n\n"), "\n\n");
        assert_eq!(normalize_tabs("  \n\t"), "  \n\t");
    }

    #[test]
    fn normalize_is_stable_with_short_blank_lines() {
        let once = normalize_tabs("  \n    a");
        assert_eq!(once, "\na");
        assert_eq!(normalize_tabs(&once), once);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_tabs("\n      # Title\n\n        indented\n      text\n    ");
        assert_eq!(normalize_tabs(&once), once);
    }

    #[test]
    fn fade_marks_each_top_level_element() {
        let html = "<p>one <em>two</em></p>\n<p class=\"x\">three</p>\n";
        assert_eq!(
            fade(html),
            "<p class=\"fade\">one <em>two</em></p>\n<p class=\"x fade\">three</p>\n"
        );
    }

    #[test]
    fn fade_skips_void_elements_when_tracking_depth() {
        assert_eq!(fade("<p>a<br>b</p><hr />"), "<p class=\"fade\">a<br>b</p><hr class=\"fade\" />");
    }

    #[test]
    fn span_wrap_then_fade() {
        assert_eq!(fade(&span_wrap("hi")), "<span class=\"fade\">hi</span>");
    }
}
