//! Loader utilities for building a story from authored files.
//!
//! Story files hold a [`StoryDef`] in TOML or RON, picked by file extension.
//! Only static text lives in files. Actions, hooks and computed text are
//! attached in Rust: [`build_registry_with`] and [`load_story_with`] hand each
//! loaded spec to a closure before it is registered, and
//! [`SituationRegistry::replace`] swaps a whole situation afterwards.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;
use vignette_data::{SituationDef, StoryDef, TextDef};

use crate::error::{SituationError, SituationResult};
use crate::registry::SituationRegistry;
use crate::situation::SituationSpec;
use crate::source::TextSource;
use crate::story::{Story, StoryConfig};

/// Read a story file. `.toml` and `.ron` are understood.
///
/// # Errors
/// File IO, an unsupported extension, or a parse failure.
pub fn load_story_def(path: &Path) -> Result<StoryDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading story from '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_story_toml(&text).with_context(|| format!("in '{}'", path.display())),
        Some("ron") => parse_story_ron(&text).with_context(|| format!("in '{}'", path.display())),
        _ => bail!("unsupported story file '{}': expected .toml or .ron", path.display()),
    }
}

/// Parse a story from TOML text.
///
/// # Errors
/// Malformed TOML or a document that doesn't match [`StoryDef`].
pub fn parse_story_toml(text: &str) -> Result<StoryDef> {
    toml::from_str(text).context("parsing story TOML")
}

/// Parse a story from RON text.
///
/// # Errors
/// Malformed RON or a document that doesn't match [`StoryDef`].
pub fn parse_story_ron(text: &str) -> Result<StoryDef> {
    ron::from_str(text).context("parsing story RON")
}

/// Convert one authored situation into a spec.
///
/// # Errors
/// - `InvalidContentType` if the content, a writer or the option text holds something other than text.
pub fn spec_from_def<C>(def: &SituationDef) -> SituationResult<SituationSpec<C>> {
    let mut spec = SituationSpec::new()
        .classes(def.classes.iter().cloned())
        .tags(def.tags.iter().cloned())
        .priority(def.priority)
        .continue_section(def.continue_section);

    if let Some(content) = &def.content {
        spec = spec.content(text_source(&def.name, "content", content)?);
    }
    if let Some(choices) = &def.choices {
        spec = spec.choices(choices.iter().cloned());
    }
    for (reference, text) in &def.writers {
        let field = format!("writer '{reference}'");
        spec = spec.writer(reference.clone(), text_source(&def.name, &field, text)?);
    }
    if let Some(option_text) = &def.option_text {
        spec = spec.option_text(text_source(&def.name, "option_text", option_text)?);
    }
    if let Some(min) = def.min_choices {
        spec = spec.min_choices(min);
    }
    if let Some(max) = def.max_choices {
        spec = spec.max_choices(max);
    }
    Ok(spec)
}

fn text_source<C>(situation: &str, field: &str, def: &TextDef) -> SituationResult<TextSource<C>> {
    def.as_text()
        .map(TextSource::Static)
        .ok_or_else(|| SituationError::InvalidContentType {
            situation: situation.to_string(),
            field: field.to_string(),
            found: def.invalid_kind().unwrap_or("unknown value").to_string(),
        })
}

/// Validate a story definition and register every situation it declares.
///
/// # Errors
/// Validation failures (reported together), non-text content, or duplicate names.
pub fn build_registry<C>(def: &StoryDef) -> Result<SituationRegistry<C>> {
    build_registry_with(def, |_, spec| spec)
}

/// Like [`build_registry`], but every spec passes through `customize` before
/// it is registered. This is where actions and hooks meet loaded text.
///
/// # Errors
/// Validation failures (reported together), non-text content, or duplicate names.
pub fn build_registry_with<C, F>(def: &StoryDef, mut customize: F) -> Result<SituationRegistry<C>>
where
    F: FnMut(&str, SituationSpec<C>) -> SituationSpec<C>,
{
    validate_storydef(def)?;
    let mut registry = SituationRegistry::new();
    for situation in &def.situations {
        let spec = customize(&situation.name, spec_from_def(situation)?);
        registry
            .define(situation.name.clone(), spec)
            .with_context(|| format!("while registering situation '{}'", situation.name))?;
    }
    info!("{} situations loaded for story \"{}\"", registry.len(), def.story.title);
    Ok(registry)
}

/// Load a story file and start a [`Story`] over it with `character`.
///
/// # Errors
/// Anything [`load_story_def`], [`build_registry`] or [`Story::new`] reports.
pub fn load_story<C>(path: &Path, character: C) -> Result<Story<C>> {
    load_story_with(path, character, |_, spec| spec)
}

/// Like [`load_story`], with a `customize` step as in [`build_registry_with`].
///
/// # Errors
/// Anything [`load_story_def`], [`build_registry_with`] or [`Story::new`] reports.
pub fn load_story_with<C, F>(path: &Path, character: C, customize: F) -> Result<Story<C>>
where
    F: FnMut(&str, SituationSpec<C>) -> SituationSpec<C>,
{
    let def = load_story_def(path)?;
    let registry = build_registry_with(&def, customize)
        .with_context(|| format!("while building story from '{}'", path.display()))?;
    let story = Story::new(registry, character, StoryConfig::from_meta(&def.story))?;
    Ok(story)
}

/// Validate the story definition and return a single aggregated error.
fn validate_storydef(def: &StoryDef) -> Result<()> {
    let errors = vignette_data::validate_story(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("story validation failed:\n{details}");
}
