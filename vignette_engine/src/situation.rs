//! Situations: named narrative states and their lifecycle.
//!
//! A [`Situation`] is built once from a [`SituationSpec`] and then driven by the
//! host through two entry points:
//!
//! - [`Situation::enter`] when the player arrives, which counts the visit, runs
//!   the `before` hook, writes the content section, runs the `after` hook and
//!   finally offers the choice list, always in that order.
//! - [`Situation::act`] when the player clicks an action link inside the
//!   situation's content; see [`crate::router`].

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::{SituationError, SituationResult};
use crate::markup::render;
use crate::router;
use crate::source::TextSource;
use crate::system::{CURRENT_SECTION_ID, CURRENT_SECTION_SELECTOR, System};
use crate::text::normalize_tabs;

/// Hook run before or after a situation's content is written.
pub type HookFn<C> = dyn Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> anyhow::Result<()>;

/// Handler behind a direct action link. Receives the clicked token.
pub type ActionFn<C> = dyn Fn(&Situation<C>, &mut C, &mut dyn System, &str) -> anyhow::Result<()>;

/// Authoring description of a situation.
///
/// Every field is optional; build one with the chained setters and hand it to
/// [`crate::registry::SituationRegistry::define`].
///
/// ```
/// use vignette_engine::situation::SituationSpec;
///
/// let spec: SituationSpec<()> = SituationSpec::new()
///     .content("You stand at the *gate*.")
///     .choices(["courtyard", "#outside"])
///     .writer("sign", "The sign reads: KEEP OUT.")
///     .class("outdoors");
/// ```
pub struct SituationSpec<C> {
    content: Option<TextSource<C>>,
    choices: Option<Vec<String>>,
    writers: HashMap<String, TextSource<C>>,
    actions: HashMap<String, Box<ActionFn<C>>>,
    before: Option<Box<HookFn<C>>>,
    after: Option<Box<HookFn<C>>>,
    classes: Vec<String>,
    tags: Vec<String>,
    option_text: Option<TextSource<C>>,
    priority: i32,
    continue_section: bool,
    min_choices: Option<usize>,
    max_choices: Option<usize>,
}

impl<C> Default for SituationSpec<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SituationSpec<C> {
    pub fn new() -> Self {
        Self {
            content: None,
            choices: None,
            writers: HashMap::new(),
            actions: HashMap::new(),
            before: None,
            after: None,
            classes: Vec::new(),
            tags: Vec::new(),
            option_text: None,
            priority: 1,
            continue_section: false,
            min_choices: None,
            max_choices: None,
        }
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<TextSource<C>>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn content_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> String + 'static,
    {
        self.content = Some(TextSource::dynamic(f));
        self
    }

    /// Situation names or `#tag` references offered after the content.
    #[must_use]
    pub fn choices<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(references.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn writer(mut self, reference: impl Into<String>, text: impl Into<TextSource<C>>) -> Self {
        self.writers.insert(reference.into(), text.into());
        self
    }

    #[must_use]
    pub fn writer_fn<F>(mut self, reference: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> String + 'static,
    {
        self.writers.insert(reference.into(), TextSource::dynamic(f));
        self
    }

    #[must_use]
    pub fn action<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, &str) -> anyhow::Result<()> + 'static,
    {
        self.actions.insert(key.into(), Box::new(f));
        self
    }

    #[must_use]
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> anyhow::Result<()> + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> anyhow::Result<()> + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Label shown when this situation appears in a choice list.
    #[must_use]
    pub fn option_text(mut self, text: impl Into<TextSource<C>>) -> Self {
        self.option_text = Some(text.into());
        self
    }

    /// Label computed each time the story moves. The provenance passed in is
    /// the situation about to be entered, which is the one offering the choice.
    #[must_use]
    pub fn option_text_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Situation<C>, &mut C, &mut dyn System, Option<&str>) -> String + 'static,
    {
        self.option_text = Some(TextSource::dynamic(f));
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Append content to the current section instead of opening a new one.
    #[must_use]
    pub fn continue_section(mut self, continue_section: bool) -> Self {
        self.continue_section = continue_section;
        self
    }

    #[must_use]
    pub fn min_choices(mut self, min: usize) -> Self {
        self.min_choices = Some(min);
        self
    }

    #[must_use]
    pub fn max_choices(mut self, max: usize) -> Self {
        self.max_choices = Some(max);
        self
    }
}

/// A registered situation.
pub struct Situation<C> {
    name: String,
    content: Option<TextSource<C>>,
    choices: Option<Vec<String>>,
    writers: HashMap<String, TextSource<C>>,
    actions: HashMap<String, Box<ActionFn<C>>>,
    before: Option<Box<HookFn<C>>>,
    after: Option<Box<HookFn<C>>>,
    classes: Vec<String>,
    tags: Vec<String>,
    option_text: Option<TextSource<C>>,
    priority: i32,
    continue_section: bool,
    min_choices: Option<usize>,
    max_choices: Option<usize>,
    visited: Cell<u32>,
}

impl<C> Situation<C> {
    pub fn new(name: impl Into<String>, spec: SituationSpec<C>) -> Self {
        Self {
            name: name.into(),
            content: spec.content,
            choices: spec.choices,
            writers: spec.writers,
            actions: spec.actions,
            before: spec.before,
            after: spec.after,
            classes: spec.classes,
            tags: spec.tags,
            option_text: spec.option_text,
            priority: spec.priority,
            continue_section: spec.continue_section,
            min_choices: spec.min_choices,
            max_choices: spec.max_choices,
            visited: Cell::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of times this situation has been entered.
    pub fn visited(&self) -> u32 {
        self.visited.get()
    }

    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn option_text(&self) -> Option<&TextSource<C>> {
        self.option_text.as_ref()
    }

    /// Choice-list label: static option text if set, otherwise the name.
    /// Dynamic option text is resolved by the host.
    pub fn label(&self) -> &str {
        match &self.option_text {
            Some(TextSource::Static(text)) => text,
            _ => &self.name,
        }
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn continues_section(&self) -> bool {
        self.continue_section
    }

    pub fn choice_bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.min_choices, self.max_choices)
    }

    pub fn writer(&self, reference: &str) -> Option<&TextSource<C>> {
        self.writers.get(reference)
    }

    pub fn action(&self, key: &str) -> Option<&ActionFn<C>> {
        self.actions.get(key).map(|action| &**action)
    }

    /// Enter the situation.
    ///
    /// `from` is the situation the player came from, `None` for the opening situation.
    ///
    /// # Errors
    /// - `HookFailed` if a `before` or `after` hook returns an error; later steps are skipped.
    pub fn enter(&self, actor: &mut C, system: &mut dyn System, from: Option<&str>) -> SituationResult<()> {
        self.visited.set(self.visited.get().saturating_add(1));
        debug!(
            "entering situation '{}' (visit {}, from {:?})",
            self.name,
            self.visited(),
            from
        );

        if let Some(before) = &self.before {
            self.run_hook(&**before, "before", actor, system, from)?;
        }

        if let Some(content) = &self.content {
            let text = content.resolve(self, actor, system, from);
            let html = render(&normalize_tabs(&text));
            if self.continue_section {
                system.write_into(&html, CURRENT_SECTION_SELECTOR);
            } else {
                system.clear_id(CURRENT_SECTION_ID);
                system.write(&self.section_html(&html));
            }
        }

        if let Some(after) = &self.after {
            self.run_hook(&**after, "after", actor, system, from)?;
        }

        if let Some(choices) = &self.choices {
            let ids = system.get_situation_id_choices(choices, self.min_choices, self.max_choices);
            system.write_choices(&ids);
        }

        Ok(())
    }

    /// Respond to an action link clicked inside this situation.
    ///
    /// # Errors
    /// Any routing failure; see [`router::dispatch`].
    pub fn act(&self, actor: &mut C, system: &mut dyn System, token: &str) -> SituationResult<()> {
        router::dispatch(self, actor, system, token)
    }

    fn run_hook(
        &self,
        hook: &HookFn<C>,
        which: &'static str,
        actor: &mut C,
        system: &mut dyn System,
        from: Option<&str>,
    ) -> SituationResult<()> {
        hook(self, actor, system, from).map_err(|source| SituationError::HookFailed {
            situation: self.name.clone(),
            hook: which,
            source,
        })
    }

    fn section_html(&self, body: &str) -> String {
        let mut class = format!("situation-{}", self.name);
        for extra in &self.classes {
            class.push(' ');
            class.push_str(extra);
        }
        format!("<section id=\"{CURRENT_SECTION_ID}\" class=\"{class}\">\n{body}</section>")
    }
}

impl<C> fmt::Debug for Situation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Situation")
            .field("name", &self.name)
            .field("visited", &self.visited.get())
            .field("content", &self.content)
            .field("choices", &self.choices)
            .field("writers", &self.writers.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("classes", &self.classes)
            .field("tags", &self.tags)
            .field("continue_section", &self.continue_section)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::recording::{Call, RecordingSystem};
    use anyhow::bail;

    #[derive(Debug, Default)]
    struct Hero {
        courage: i32,
    }

    fn test_situation() -> Situation<Hero> {
        Situation::new(
            "test-situation",
            SituationSpec::<Hero>::new()
                .content("This is the content of the *testing* situation.")
                .choices(["#foo"]),
        )
    }

    #[test]
    fn has_a_name_and_starts_unvisited() {
        let situation = test_situation();
        assert_eq!(situation.name(), "test-situation");
        assert_eq!(situation.visited(), 0);
    }

    #[test]
    fn enter_writes_a_new_section() {
        let situation = test_situation();
        let mut system = RecordingSystem::answering(&["foo", "foo-bar"]);
        situation.enter(&mut Hero::default(), &mut system, None).expect("enter");

        assert_eq!(
            system.calls,
            vec![
                Call::ClearId(CURRENT_SECTION_ID.into()),
                Call::Write(
                    "<section id=\"current-situation\" class=\"situation-test-situation\">\n\
                     <p>This is the content of the <em>testing</em> situation.</p>\n</section>"
                        .into()
                ),
                Call::GetChoices(vec!["#foo".into()], None, None),
                Call::WriteChoices(vec!["foo".into(), "foo-bar".into()]),
            ]
        );
    }

    #[test]
    fn visited_counts_every_entry() {
        let bare: Situation<Hero> = Situation::new("bare", SituationSpec::<Hero>::new());
        let mut system = RecordingSystem::default();
        let mut hero = Hero::default();
        for expected in 1..=3 {
            bare.enter(&mut hero, &mut system, Some("elsewhere")).expect("enter");
            assert_eq!(bare.visited(), expected);
        }
        assert!(system.calls.is_empty());
    }

    #[test]
    fn dynamic_content_gets_provenance_and_normalizing() {
        let situation: Situation<Hero> = Situation::new(
            "echo",
            SituationSpec::<Hero>::new().content_fn(|_, _, _, from| {
                format!(
                    "
                    from is {}
                    ",
                    from.unwrap_or("nowhere")
                )
            }),
        );
        let mut system = RecordingSystem::default();
        situation.enter(&mut Hero::default(), &mut system, Some("A")).expect("enter");
        assert_eq!(
            system.writes(),
            vec!["<section id=\"current-situation\" class=\"situation-echo\">\n<p>from is A</p>\n</section>"]
        );
    }

    #[test]
    fn classes_are_added_to_the_section() {
        let situation: Situation<Hero> = Situation::new(
            "cellar",
            SituationSpec::<Hero>::new().content("Dark.").classes(["dark", "cold"]),
        );
        let mut system = RecordingSystem::default();
        situation.enter(&mut Hero::default(), &mut system, None).expect("enter");
        assert!(system.writes()[0].starts_with("<section id=\"current-situation\" class=\"situation-cellar dark cold\">"));
    }

    #[test]
    fn continue_section_appends_into_current_section() {
        let situation: Situation<Hero> = Situation::new(
            "more",
            SituationSpec::<Hero>::new().content("And more.").continue_section(true),
        );
        let mut system = RecordingSystem::default();
        situation.enter(&mut Hero::default(), &mut system, None).expect("enter");
        assert_eq!(
            system.calls,
            vec![Call::WriteInto("<p>And more.</p>\n".into(), CURRENT_SECTION_SELECTOR.into())]
        );
    }

    #[test]
    fn steps_run_in_fixed_order() {
        let situation: Situation<Hero> = Situation::new(
            "ordered",
            SituationSpec::<Hero>::new()
                .before(|_, hero, system, _| {
                    hero.courage += 1;
                    system.write("before");
                    Ok(())
                })
                .content("middle")
                .after(|_, hero, system, _| {
                    system.write(&format!("after {}", hero.courage));
                    Ok(())
                })
                .choices(Vec::<String>::new())
                .min_choices(1)
                .max_choices(2),
        );
        let mut system = RecordingSystem::default();
        situation.enter(&mut Hero::default(), &mut system, None).expect("enter");

        assert_eq!(system.calls[0], Call::Write("before".into()));
        assert_eq!(system.calls[1], Call::ClearId(CURRENT_SECTION_ID.into()));
        assert!(matches!(&system.calls[2], Call::Write(html) if html.contains("<p>middle</p>")));
        assert_eq!(system.calls[3], Call::Write("after 1".into()));
        assert_eq!(system.calls[4], Call::GetChoices(Vec::new(), Some(1), Some(2)));
        assert_eq!(system.calls[5], Call::WriteChoices(Vec::new()));
    }

    #[test]
    fn failing_hook_stops_entry_but_counts_visit() {
        let situation: Situation<Hero> = Situation::new(
            "trap",
            SituationSpec::<Hero>::new()
                .before(|_, _, _, _| bail!("the floor gives way"))
                .content("unreachable"),
        );
        let mut system = RecordingSystem::default();
        let err = situation
            .enter(&mut Hero::default(), &mut system, None)
            .expect_err("hook should fail");
        assert!(matches!(err, SituationError::HookFailed { hook: "before", .. }));
        assert_eq!(situation.visited(), 1);
        assert!(system.calls.is_empty());
    }

    #[test]
    fn label_prefers_option_text() {
        let plain: Situation<Hero> = Situation::new("plain", SituationSpec::<Hero>::new());
        let labelled: Situation<Hero> = Situation::new("labelled", SituationSpec::<Hero>::new().option_text("Go *there*"));
        assert_eq!(plain.label(), "plain");
        assert_eq!(labelled.label(), "Go *there*");
        let computed: Situation<Hero> = Situation::new(
            "computed",
            SituationSpec::<Hero>::new().option_text_fn(|_, hero, _, _| format!("Courage {}", hero.courage)),
        );
        assert_eq!(computed.label(), "computed");
        assert!(computed.option_text().is_some_and(|text| !text.is_static()));
    }
}
