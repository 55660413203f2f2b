//! View module.
//!
//! The document the player reads, kept in memory as a list of top-level HTML
//! blocks. Situations never see the view directly; the story host forwards
//! the [`System`](crate::system::System) write primitives to it.
//!
//! Elements are addressed by `#id` selectors. The view only understands the
//! HTML the engine itself produces (well-formed, double-quoted attributes), so
//! element lookup is a tag scan rather than a full parser.
use std::fmt::Write;
use std::sync::LazyLock;

use log::{trace, warn};
use regex::{Captures, Regex};

use crate::markup::render_inline;
use crate::text::{CLASS_ATTR, TAG, is_void};

static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+id\s*=\s*"([^"]*)""#).expect("id pattern is valid"));
static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\shref\s*=\s*"([^"]*)""#).expect("href pattern is valid"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a(\s[^>]*)?>(.*?)</a\s*>").expect("link pattern is valid"));

/// Class given to links that have been retired after a "once" click.
pub const RETIRED_LINK_CLASS: &str = "ex_link";
/// Class that marks a link as clickable only once.
pub const ONCE_LINK_CLASS: &str = "once";
/// Class that keeps a link live after the player moves to another situation.
pub const STICKY_LINK_CLASS: &str = "sticky";

/// Byte offsets of one element inside a block.
#[derive(Debug, Clone, Copy)]
struct Element {
    start: usize,
    open_end: usize,
    inner_end: usize,
    end: usize,
}

impl Element {
    fn is_void(self) -> bool {
        self.inner_end == self.open_end && self.end == self.open_end
    }
}

/// In-memory document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    blocks: Vec<String>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level blocks in the order they were written.
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// The whole document.
    pub fn html(&self) -> String {
        self.blocks.join("\n")
    }

    /// The document with every tag removed.
    pub fn text(&self) -> String {
        TAG.replace_all(&self.html(), "").into_owned()
    }

    pub fn write(&mut self, html: &str) {
        self.blocks.push(html.to_string());
    }

    /// Append `html` at the end of the element matched by `selector`.
    pub fn write_into(&mut self, html: &str, selector: &str) {
        let Some((block, element)) = self.select(selector) else {
            return;
        };
        if element.is_void() {
            warn!("cannot write into void element '{selector}'; ignored");
            return;
        }
        self.blocks[block].insert_str(element.inner_end, html);
    }

    /// Replace the element matched by `selector`, tags included.
    pub fn replace_with(&mut self, html: &str, selector: &str) {
        let Some((block, element)) = self.select(selector) else {
            return;
        };
        self.blocks[block].replace_range(element.start..element.end, html);
    }

    /// Drop the `id` attribute from the element that carries it.
    ///
    /// A missing element is not an error: the first situation entered has no
    /// previous section to clear.
    pub fn clear_id(&mut self, id: &str) {
        let Some((block, element)) = self.locate(id) else {
            trace!("clear_id: no element with id '{id}'");
            return;
        };
        let open = &self.blocks[block][element.start..element.open_end];
        let Some(range) = ID_ATTR
            .captures_iter(open)
            .find(|caps| &caps[1] == id)
            .and_then(|caps| caps.get(0))
            .map(|m| element.start + m.start()..element.start + m.end())
        else {
            return;
        };
        self.blocks[block].replace_range(range, "");
    }

    /// Append a choice list. Each entry is `(situation id, label)`; labels are inline markdown.
    pub fn write_choices(&mut self, choices: &[(String, String)]) {
        if choices.is_empty() {
            return;
        }
        let mut html = String::from("<ul class=\"options\">");
        for (id, label) in choices {
            let _ = write!(html, "<li><a href=\"{id}\">{}</a></li>", render_inline(label));
        }
        html.push_str("</ul>");
        self.blocks.push(html);
    }

    /// Whether a live link with exactly this href is in the document.
    pub fn has_link(&self, href: &str) -> bool {
        self.links(href).next().is_some()
    }

    /// Whether any live link with this href carries the `once` class.
    pub fn link_is_once(&self, href: &str) -> bool {
        self.links(href).any(|attrs| has_class(attrs, ONCE_LINK_CLASS))
    }

    /// Turn every link with this href into plain text. Returns how many were retired.
    pub fn retire_links(&mut self, href: &str) -> usize {
        let retired = self.retire_where(|attrs| href_of(attrs) == Some(href));
        trace!("retired {retired} link(s) to '{href}'");
        retired
    }

    /// Retire every live link that isn't marked `sticky`. Returns how many were retired.
    pub fn retire_transient_links(&mut self) -> usize {
        let retired = self.retire_where(|attrs| !has_class(attrs, STICKY_LINK_CLASS));
        trace!("retired {retired} transient link(s)");
        retired
    }

    fn retire_where(&mut self, mut retire: impl FnMut(&str) -> bool) -> usize {
        let mut retired = 0;
        for block in &mut self.blocks {
            let replaced = LINK.replace_all(block, |caps: &Captures| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                if retire(attrs) {
                    retired += 1;
                    format!("<span class=\"{RETIRED_LINK_CLASS}\">{}</span>", &caps[2])
                } else {
                    caps[0].to_string()
                }
            });
            *block = replaced.into_owned();
        }
        retired
    }

    /// Attribute strings of every live link whose href is `href`.
    fn links<'a>(&'a self, href: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.blocks.iter().flat_map(move |block| {
            LINK.captures_iter(block)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
                .filter(move |attrs| href_of(attrs) == Some(href))
        })
    }

    fn select(&self, selector: &str) -> Option<(usize, Element)> {
        let Some(id) = selector.strip_prefix('#') else {
            warn!("unsupported selector '{selector}'; only #id is understood");
            return None;
        };
        let found = self.locate(id);
        if found.is_none() {
            warn!("no element matches '{selector}'; ignored");
        }
        found
    }

    fn locate(&self, id: &str) -> Option<(usize, Element)> {
        self.blocks
            .iter()
            .enumerate()
            .find_map(|(index, block)| find_element(block, id).map(|element| (index, element)))
    }
}

fn href_of(attrs: &str) -> Option<&str> {
    HREF_ATTR.captures(attrs).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

fn has_class(attrs: &str, class: &str) -> bool {
    CLASS_ATTR
        .captures(attrs)
        .is_some_and(|caps| caps[2].split_whitespace().any(|c| c == class))
}

fn has_id(attrs: &str, id: &str) -> bool {
    ID_ATTR.captures_iter(attrs).any(|caps| &caps[1] == id)
}

/// Find the first element with `id` and the offsets of its closing tag.
fn find_element(html: &str, id: &str) -> Option<Element> {
    let mut open: Option<(usize, usize)> = None;
    let mut depth = 0usize;

    for caps in TAG.captures_iter(html) {
        let whole = caps.get(0)?;
        let closing = !caps[1].is_empty();
        let attrs = &caps[3];
        let self_closing = attrs.ends_with('/') || is_void(&caps[2]);

        match open {
            None => {
                if closing || !has_id(attrs, id) {
                    continue;
                }
                if self_closing {
                    return Some(Element {
                        start: whole.start(),
                        open_end: whole.end(),
                        inner_end: whole.end(),
                        end: whole.end(),
                    });
                }
                open = Some((whole.start(), whole.end()));
                depth = 1;
            },
            Some((start, open_end)) => {
                if closing {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Element {
                            start,
                            open_end,
                            inner_end: whole.start(),
                            end: whole.end(),
                        });
                    }
                } else if !self_closing {
                    depth += 1;
                }
            },
        }
    }
    None
}
