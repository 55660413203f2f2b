//! Choice resolution.
//!
//! Turns a situation's choice references into the list of situation ids
//! offered to the player. References are situation names or `#tag`s. The
//! candidates are grouped into priority tiers, then trimmed to the
//! situation's `min_choices`/`max_choices` bounds.

use std::collections::HashSet;

use log::{trace, warn};
use rand::Rng;
use rand::seq::index::sample;

use crate::registry::SituationRegistry;

/// What choice resolution needs to know about one situation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceEntry {
    pub name: String,
    pub tags: Vec<String>,
    pub priority: i32,
    pub label: String,
}

/// Choice metadata for every registered situation, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ChoiceCatalog {
    entries: Vec<ChoiceEntry>,
}

impl ChoiceCatalog {
    pub fn new(entries: Vec<ChoiceEntry>) -> Self {
        Self { entries }
    }

    pub fn from_registry<C>(registry: &SituationRegistry<C>) -> Self {
        let entries = registry
            .iter()
            .map(|situation| ChoiceEntry {
                name: situation.name().to_string(),
                tags: situation.tags().to_vec(),
                priority: situation.priority(),
                label: situation.label().to_string(),
            })
            .collect();
        Self { entries }
    }

    pub fn entry(&self, name: &str) -> Option<&ChoiceEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Change the label of a known situation. Returns `false` for unknown names.
    pub fn set_label(&mut self, name: &str, label: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.label = label.into();
                true
            },
            None => false,
        }
    }

    /// Label for `name`, falling back to the name itself.
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.entry(name).map_or(name, |entry| entry.label.as_str())
    }

    /// Resolve choice references into situation ids.
    ///
    /// Tag references expand in registration order and duplicates keep their
    /// first position. Higher priority tiers come first. With `min` set,
    /// lower tiers are only consulted until at least `min` candidates are
    /// taken. With `max` set, the tier that would overflow is sampled at
    /// random, keeping its original order.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        references: &[String],
        min: Option<usize>,
        max: Option<usize>,
        rng: &mut R,
    ) -> Vec<String> {
        let mut candidates = self.expand(references);
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut taken: Vec<&ChoiceEntry> = Vec::new();
        for tier in candidates.chunk_by(|a, b| a.priority == b.priority) {
            if min.is_some_and(|min| !taken.is_empty() && taken.len() >= min) {
                break;
            }
            taken.extend_from_slice(tier);
        }

        if let Some(max) = max.filter(|&max| taken.len() > max) {
            taken = limit(&taken, max, rng);
        }

        let ids: Vec<String> = taken.iter().map(|entry| entry.name.clone()).collect();
        trace!("choices {references:?} (min {min:?}, max {max:?}) resolved to {ids:?}");
        ids
    }

    fn expand(&self, references: &[String]) -> Vec<&ChoiceEntry> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for reference in references {
            if let Some(tag) = reference.strip_prefix('#') {
                for entry in self.entries.iter().filter(|entry| entry.tags.iter().any(|t| t == tag)) {
                    if seen.insert(entry.name.as_str()) {
                        out.push(entry);
                    }
                }
            } else if let Some(entry) = self.entry(reference) {
                if seen.insert(entry.name.as_str()) {
                    out.push(entry);
                }
            } else {
                warn!("choice reference '{reference}' names no situation; skipped");
            }
        }
        out
    }
}

/// Keep whole tiers while they fit under `max`, then sample the first tier that doesn't.
fn limit<'a, R: Rng + ?Sized>(taken: &[&'a ChoiceEntry], max: usize, rng: &mut R) -> Vec<&'a ChoiceEntry> {
    let mut kept = Vec::with_capacity(max);
    for tier in taken.chunk_by(|a, b| a.priority == b.priority) {
        let room = max - kept.len();
        if tier.len() <= room {
            kept.extend_from_slice(tier);
            continue;
        }
        let mut picks = sample(rng, tier.len(), room).into_vec();
        picks.sort_unstable();
        kept.extend(picks.into_iter().map(|i| tier[i]));
        break;
    }
    kept
}
