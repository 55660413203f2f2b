//! Situation registry.
//!
//! Situations are registered once at startup and looked up by name for the
//! life of the story. Registration order is preserved; it decides the order of
//! tag-expanded choices.

use std::collections::HashMap;

use log::info;
use vignette_data::name_problem;

use crate::error::{SituationError, SituationResult};
use crate::situation::{Situation, SituationSpec};

/// All situations of a story, keyed by name.
pub struct SituationRegistry<C> {
    situations: Vec<Situation<C>>,
    index: HashMap<String, usize>,
}

impl<C> Default for SituationRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SituationRegistry<C> {
    pub fn new() -> Self {
        Self {
            situations: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a situation from `spec` and register it under `name`.
    ///
    /// # Errors
    /// - `DuplicateSituation` if `name` is already registered; the existing situation is kept.
    pub fn define(&mut self, name: impl Into<String>, spec: SituationSpec<C>) -> SituationResult<&Situation<C>> {
        self.insert(Situation::new(name, spec))
    }

    /// Register an already built situation.
    ///
    /// # Errors
    /// - `InvalidSituationName` if the name is empty or can't appear in a link href.
    /// - `DuplicateSituation` if a situation with the same name exists.
    pub fn insert(&mut self, situation: Situation<C>) -> SituationResult<&Situation<C>> {
        if let Some(problem) = name_problem(situation.name()) {
            return Err(SituationError::InvalidSituationName {
                name: situation.name().to_string(),
                problem,
            });
        }
        if self.index.contains_key(situation.name()) {
            return Err(SituationError::DuplicateSituation(situation.name().to_string()));
        }
        let slot = self.situations.len();
        info!("situation '{}' registered", situation.name());
        self.index.insert(situation.name().to_string(), slot);
        self.situations.push(situation);
        Ok(&self.situations[slot])
    }

    /// Swap the situation registered under `name` for one built from `spec`.
    ///
    /// The new situation keeps the old one's place in registration order and
    /// starts unvisited. The old situation is handed back.
    ///
    /// # Errors
    /// - `UnknownSituation` if nothing is registered under `name`.
    pub fn replace(&mut self, name: &str, spec: SituationSpec<C>) -> SituationResult<Situation<C>> {
        let &slot = self
            .index
            .get(name)
            .ok_or_else(|| SituationError::UnknownSituation(name.to_string()))?;
        info!("situation '{name}' replaced");
        Ok(std::mem::replace(&mut self.situations[slot], Situation::new(name, spec)))
    }

    pub fn get(&self, name: &str) -> Option<&Situation<C>> {
        self.index.get(name).map(|&slot| &self.situations[slot])
    }

    /// Like [`get`](Self::get), but a missing name is an error.
    ///
    /// # Errors
    /// - `UnknownSituation` if nothing is registered under `name`.
    pub fn require(&self, name: &str) -> SituationResult<&Situation<C>> {
        self.get(name)
            .ok_or_else(|| SituationError::UnknownSituation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.situations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.situations.is_empty()
    }

    /// Situations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Situation<C>> {
        self.situations.iter()
    }
}
