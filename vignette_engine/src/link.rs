//! Link addressing.
//!
//! Action links embedded in rendered content carry an href of the form
//! `./<token>`. The token says which kind of response the link asks for:
//!
//! ```text
//! ./_writer_<ref>     append writer <ref> to the current section
//! ./_replacer_<ref>   replace element #<ref> with writer <ref>
//! ./_inserter_<ref>   insert writer <ref> into element #<ref>
//! ./<action>          call the situation's action <action>
//! ```
//!
//! Any href without the `./` prefix is a situation link and never reaches this
//! module's decoder.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use variantly::Variantly;

/// Href prefix marking a link as an action in the current situation.
pub const ACTION_PREFIX: &str = "./";

static SPECIAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_(writer|replacer|inserter)_(.+)$").expect("token pattern is valid"));

/// The response a link asks its situation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Variantly)]
pub enum LinkKind {
    Writer,
    Replacer,
    Inserter,
    Action,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Writer => "writer",
            LinkKind::Replacer => "replacer",
            LinkKind::Inserter => "inserter",
            LinkKind::Action => "action",
        }
    }

    /// Parse one of the three prefixed kinds. `action` has no prefix and is not accepted here.
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "writer" => Some(LinkKind::Writer),
            "replacer" => Some(LinkKind::Replacer),
            "inserter" => Some(LinkKind::Inserter),
            _ => None,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded action token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAddress {
    pub kind: LinkKind,
    pub reference: String,
}

impl LinkAddress {
    pub fn new(kind: LinkKind, reference: impl Into<String>) -> Self {
        Self {
            kind,
            reference: reference.into(),
        }
    }

    /// Encode back into a token.
    pub fn token(&self) -> String {
        encode(self.kind, &self.reference)
    }
}

/// Encode a link kind and reference as an action token (no `./` prefix).
pub fn encode(kind: LinkKind, reference: &str) -> String {
    match kind {
        LinkKind::Action => reference.to_string(),
        other => format!("_{other}_{reference}"),
    }
}

/// Encode a link kind and reference as an href suitable for rendered markup.
pub fn href(kind: LinkKind, reference: &str) -> String {
    format!("{ACTION_PREFIX}{}", encode(kind, reference))
}

/// Decode an action token.
///
/// Returns `None` only for the empty token. A token that doesn't fully match a
/// prefixed kind (for example `_writer_` with no reference, or an unknown kind
/// like `_shout_x`) is a direct action named by the whole token.
pub fn decode(token: &str) -> Option<LinkAddress> {
    if token.is_empty() {
        return None;
    }
    if let Some(caps) = SPECIAL_TOKEN.captures(token)
        && let Some(kind) = LinkKind::from_prefix(&caps[1])
    {
        return Some(LinkAddress::new(kind, &caps[2]));
    }
    Some(LinkAddress::new(LinkKind::Action, token))
}
