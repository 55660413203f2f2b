//! Story host.
//!
//! [`Story`] owns everything a running story needs: the situation registry,
//! the character, the name of the active situation and a [`Host`] that
//! implements [`System`] over an in-memory [`View`]. The embedding front end
//! only feeds it the hrefs of links the player clicks.
//!
//! Link forms understood by [`Story::follow`]:
//!
//! - `./token`: act within the current situation
//! - `name`: enter situation `name`
//! - `name/token`: enter `name`, then act within it
//!
//! Following a link to the situation that is already current does not re-enter it.

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use vignette_data::StoryMeta;

use crate::choices::ChoiceCatalog;
use crate::error::{SituationError, SituationResult};
use crate::link::ACTION_PREFIX;
use crate::registry::SituationRegistry;
use crate::system::System;
use crate::view::View;

/// Startup settings for a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Situation entered by [`Story::begin`].
    pub start: String,
    /// Seed for choice sampling and [`System::random`]. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            start: "start".to_string(),
            seed: None,
        }
    }
}

impl StoryConfig {
    pub fn from_meta(meta: &StoryMeta) -> Self {
        Self {
            start: meta.start.clone(),
            seed: meta.seed,
        }
    }
}

/// The [`System`] a story hands to its situations.
#[derive(Debug)]
pub struct Host {
    view: View,
    rng: StdRng,
    catalog: ChoiceCatalog,
}

impl Host {
    pub fn new(catalog: ChoiceCatalog, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            view: View::new(),
            rng,
            catalog,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn catalog(&self) -> &ChoiceCatalog {
        &self.catalog
    }
}

impl System for Host {
    fn write(&mut self, html: &str) {
        self.view.write(html);
    }

    fn write_into(&mut self, html: &str, selector: &str) {
        self.view.write_into(html, selector);
    }

    fn replace_with(&mut self, html: &str, selector: &str) {
        self.view.replace_with(html, selector);
    }

    fn clear_id(&mut self, id: &str) {
        self.view.clear_id(id);
    }

    fn write_choices(&mut self, situation_ids: &[String]) {
        let choices: Vec<(String, String)> = situation_ids
            .iter()
            .map(|id| (id.clone(), self.catalog.label(id).to_string()))
            .collect();
        self.view.write_choices(&choices);
    }

    fn get_situation_id_choices(
        &mut self,
        references: &[String],
        min_choices: Option<usize>,
        max_choices: Option<usize>,
    ) -> Vec<String> {
        self.catalog.resolve(references, min_choices, max_choices, &mut self.rng)
    }

    fn random(&mut self) -> f64 {
        self.rng.random()
    }
}

/// A running story.
pub struct Story<C> {
    registry: SituationRegistry<C>,
    host: Host,
    character: C,
    start: String,
    current: Option<String>,
}

impl<C> Story<C> {
    /// Set up a story over a fully populated registry.
    ///
    /// # Errors
    /// - `UnknownChoiceTarget` if a situation offers a plain choice naming no registered situation.
    pub fn new(registry: SituationRegistry<C>, character: C, config: StoryConfig) -> SituationResult<Self> {
        for situation in registry.iter() {
            let targets = situation.choices().unwrap_or_default();
            if let Some(target) = targets
                .iter()
                .find(|target| !target.starts_with('#') && !registry.contains(target))
            {
                return Err(SituationError::UnknownChoiceTarget {
                    situation: situation.name().to_string(),
                    target: target.clone(),
                });
            }
        }

        let catalog = ChoiceCatalog::from_registry(&registry);
        info!(
            "story ready with {} situations (start '{}', seed {:?})",
            registry.len(),
            config.start,
            config.seed
        );
        Ok(Self {
            registry,
            host: Host::new(catalog, config.seed),
            character,
            start: config.start,
            current: None,
        })
    }

    /// Enter the start situation. There is no previous situation to report.
    ///
    /// # Errors
    /// - `UnknownSituation` if the start situation is not registered
    /// - any error raised while entering it
    pub fn begin(&mut self) -> SituationResult<()> {
        info!("beginning story at '{}'", self.start);
        let start = self.start.clone();
        self.go_to(&start)
    }

    /// Enter situation `name`, reporting the current situation as where the player came from.
    ///
    /// Moving to a different situation first retires every link on the page
    /// that isn't marked `sticky`. Dynamic option text is then recomputed so
    /// the choices written on entry carry fresh labels.
    ///
    /// # Errors
    /// - `UnknownSituation` if `name` is not registered
    /// - any error raised while entering it
    pub fn go_to(&mut self, name: &str) -> SituationResult<()> {
        let situation = self.registry.require(name)?;
        if self.current.as_deref().is_some_and(|current| current != name) {
            self.host.view_mut().retire_transient_links();
        }
        let from = self.current.replace(name.to_string());
        debug!("moving from {from:?} to '{name}'");
        refresh_labels(&self.registry, &mut self.character, &mut self.host, name);
        situation.enter(&mut self.character, &mut self.host, from.as_deref())
    }

    /// Run an action token in the current situation.
    ///
    /// # Errors
    /// - `NoCurrentSituation` before [`begin`](Self::begin)
    /// - any routing error; see [`crate::router::dispatch`]
    pub fn act(&mut self, token: &str) -> SituationResult<()> {
        let name = self.current.as_deref().ok_or(SituationError::NoCurrentSituation)?;
        let situation = self.registry.require(name)?;
        debug!("acting '{token}' in '{name}'");
        situation.act(&mut self.character, &mut self.host, token)
    }

    /// Follow a link href without checking that it is on the page.
    ///
    /// # Errors
    /// Whatever moving or acting reports.
    pub fn follow(&mut self, href: &str) -> SituationResult<()> {
        if let Some(token) = href.strip_prefix(ACTION_PREFIX) {
            return self.act(token);
        }

        let (name, token) = match href.split_once('/') {
            Some((name, token)) => (name, Some(token)),
            None => (href, None),
        };
        if self.current.as_deref() == Some(name) {
            debug!("already in '{name}'; not re-entering");
        } else {
            self.go_to(name)?;
        }
        match token {
            Some(token) => self.act(token),
            None => Ok(()),
        }
    }

    /// Click a link in the view.
    ///
    /// The link must be live. If it is marked `once`, every link with the same
    /// href is retired before the link is followed.
    ///
    /// # Errors
    /// - `MissingLink` if no live link has this href
    /// - whatever [`follow`](Self::follow) reports
    pub fn click(&mut self, href: &str) -> SituationResult<()> {
        let view = self.host.view_mut();
        if !view.has_link(href) {
            return Err(SituationError::MissingLink(href.to_string()));
        }
        if view.link_is_once(href) {
            view.retire_links(href);
        }
        self.follow(href)
    }

    pub fn view(&self) -> &View {
        self.host.view()
    }

    pub fn character(&self) -> &C {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut C {
        &mut self.character
    }

    /// Name of the active situation, `None` before the story begins.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn registry(&self) -> &SituationRegistry<C> {
        &self.registry
    }

    /// The story's [`System`], for driving situations by hand.
    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }
}

/// Resolve every dynamic option text into the host's choice catalog.
fn refresh_labels<C>(registry: &SituationRegistry<C>, character: &mut C, host: &mut Host, entering: &str) {
    for situation in registry.iter() {
        let Some(source) = situation.option_text().filter(|source| !source.is_static()) else {
            continue;
        };
        let label = source.resolve(situation, character, &mut *host, Some(entering));
        trace!("option text of '{}' is now {label:?}", situation.name());
        host.catalog.set_label(situation.name(), label);
    }
}
