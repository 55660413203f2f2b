//! Content sources.
//!
//! Situation content and writer text are either fixed strings or functions of
//! the current state. [`TextSource`] holds either form and [`TextSource::resolve`]
//! turns it into a string at the moment it is needed.

use std::fmt;

use crate::situation::Situation;
use crate::system::System;

/// Signature of a dynamic text source.
///
/// Arguments are the owning situation, the character, the system, and the
/// provenance: the situation the player came from on `enter`, or the clicked
/// token when resolving a writer.
pub type TextFn<C> = dyn Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> String;

/// Authored text, fixed or computed.
pub enum TextSource<C> {
    Static(String),
    Dynamic(Box<TextFn<C>>),
}

impl<C> TextSource<C> {
    /// Wrap a function as a text source.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> String + 'static,
    {
        TextSource::Dynamic(Box::new(f))
    }

    /// Produce the text. Static text ignores every argument.
    pub fn resolve(&self, owner: &Situation<C>, actor: &mut C, system: &mut dyn System, provenance: Option<&str>) -> String {
        match self {
            TextSource::Static(text) => text.clone(),
            TextSource::Dynamic(f) => f(owner, actor, system, provenance),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, TextSource::Static(_))
    }
}

impl<C> From<&str> for TextSource<C> {
    fn from(text: &str) -> Self {
        TextSource::Static(text.to_string())
    }
}

impl<C> From<String> for TextSource<C> {
    fn from(text: String) -> Self {
        TextSource::Static(text)
    }
}

impl<C> fmt::Debug for TextSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Static(text) => f.debug_tuple("Static").field(text).finish(),
            TextSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::situation::SituationSpec;
    use crate::system::recording::RecordingSystem;

    #[derive(Default)]
    struct Reader {
        name: String,
        reads: u32,
    }

    fn owner() -> Situation<Reader> {
        Situation::new("library", SituationSpec::new())
    }

    #[test]
    fn static_text_ignores_arguments() {
        let source: TextSource<Reader> = "plain".into();
        let mut reader = Reader::default();
        let mut system = RecordingSystem::default();
        assert!(source.is_static());
        assert_eq!(source.resolve(&owner(), &mut reader, &mut system, Some("hall")), "plain");
        assert!(system.calls.is_empty());
    }

    #[test]
    fn dynamic_text_sees_owner_actor_and_provenance() {
        let source = TextSource::dynamic(|situation: &Situation<Reader>, reader: &mut Reader, _, from| {
            reader.reads += 1;
            format!(
                "{} in {} from {}",
                reader.name,
                situation.name(),
                from.unwrap_or("nowhere")
            )
        });
        let mut reader = Reader {
            name: "Ada".into(),
            reads: 0,
        };
        let mut system = RecordingSystem::default();
        let text = source.resolve(&owner(), &mut reader, &mut system, Some("hall"));
        assert_eq!(text, "Ada in library from hall");
        assert_eq!(reader.reads, 1);
        assert_eq!(
            source.resolve(&owner(), &mut reader, &mut system, None),
            "Ada in library from nowhere"
        );
    }

    #[test]
    fn debug_hides_closures() {
        let source: TextSource<Reader> = TextSource::dynamic(|_, _, _, _| String::new());
        assert_eq!(format!("{source:?}"), "Dynamic(..)");
    }
}
