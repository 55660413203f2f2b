use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier used for situation names and choice references.
pub type Id = String;

/// Top-level story file loaded by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoryDef {
    pub story: StoryMeta,
    #[serde(default)]
    pub situations: Vec<SituationDef>,
}

/// Story-level metadata and startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMeta {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_start")]
    pub start: Id,
    /// Seed for the story's random number generator. Unseeded stories draw from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for StoryMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            start: default_start(),
            seed: None,
        }
    }
}

fn default_start() -> Id {
    "start".to_string()
}

/// A situation as it appears in a story file.
///
/// Only static text can be authored here; actions and hooks are attached in Rust.
/// Unknown keys are rejected so typos in story files fail loudly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SituationDef {
    pub name: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<TextDef>,
    /// Situation names or `#tag` references. Absent means no choice list at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub writers: BTreeMap<String, TextDef>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Choice-list label. Like content, a string or a list of lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_text: Option<TextDef>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub continue_section: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_choices: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_choices: Option<usize>,
}

impl Default for SituationDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            content: None,
            choices: None,
            writers: BTreeMap::new(),
            classes: Vec::new(),
            tags: Vec::new(),
            option_text: None,
            priority: default_priority(),
            continue_section: false,
            min_choices: None,
            max_choices: None,
        }
    }
}

fn default_priority() -> i32 {
    1
}

/// Authored text: a single string, or a list of lines joined with newlines.
///
/// Any other value in the file is kept as `Invalid` instead of failing the whole
/// parse, so the engine can report exactly which situation and field is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextDef {
    Text(String),
    Lines(Vec<String>),
    Invalid { found: String },
}

impl TextDef {
    /// The authored text, or `None` if the file held something that isn't text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            TextDef::Text(text) => Some(text.clone()),
            TextDef::Lines(lines) => Some(lines.join("\n")),
            TextDef::Invalid { .. } => None,
        }
    }

    /// Description of the offending value for `Invalid`, `None` otherwise.
    pub fn invalid_kind(&self) -> Option<&str> {
        match self {
            TextDef::Invalid { found } => Some(found),
            _ => None,
        }
    }
}

impl From<&str> for TextDef {
    fn from(value: &str) -> Self {
        TextDef::Text(value.to_string())
    }
}

impl Serialize for TextDef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TextDef::Text(text) => serializer.serialize_str(text),
            TextDef::Lines(lines) => lines.serialize(serializer),
            TextDef::Invalid { found } => Err(ser::Error::custom(format!("cannot write non-text value ({found})"))),
        }
    }
}

impl<'de> Deserialize<'de> for TextDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TextDefVisitor)
    }
}

struct TextDefVisitor;

impl<'de> Visitor<'de> for TextDefVisitor {
    type Value = TextDef;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a list of strings")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TextDef, E> {
        Ok(TextDef::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<TextDef, E> {
        Ok(TextDef::Text(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<TextDef, E> {
        Ok(TextDef::Text(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<TextDef, E> {
        Ok(TextDef::Invalid {
            found: format!("boolean `{v}`"),
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TextDef, E> {
        Ok(TextDef::Invalid {
            found: format!("integer `{v}`"),
        })
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TextDef, E> {
        Ok(TextDef::Invalid {
            found: format!("integer `{v}`"),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TextDef, E> {
        Ok(TextDef::Invalid {
            found: format!("float `{v}`"),
        })
    }

    fn visit_unit<E: de::Error>(self) -> Result<TextDef, E> {
        Ok(TextDef::Invalid { found: "unit".into() })
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<TextDef, D::Error> {
        deserializer.deserialize_any(TextDefVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TextDef, A::Error> {
        let mut lines = Vec::new();
        let mut invalid = None;
        while let Some(element) = seq.next_element::<TextDef>()? {
            match element {
                TextDef::Text(line) => lines.push(line),
                TextDef::Lines(_) => {
                    invalid.get_or_insert_with(|| "nested list".to_string());
                },
                TextDef::Invalid { found } => {
                    invalid.get_or_insert_with(|| format!("list containing {found}"));
                },
            }
        }
        Ok(match invalid {
            Some(found) => TextDef::Invalid { found },
            None => TextDef::Lines(lines),
        })
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TextDef, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(TextDef::Invalid { found: "table".into() })
    }
}
