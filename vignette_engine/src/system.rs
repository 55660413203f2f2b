//! The capability surface a situation uses to reach the outside world.
//!
//! Situations never touch the document directly. Everything they output goes
//! through a [`System`], which the host implements (see [`crate::story::Story`]
//! for the reference host backed by an in-memory [`crate::view::View`]).
//!
//! Selectors are `#id` strings naming a single element.

/// Id carried by the section that holds the most recently entered situation.
pub const CURRENT_SECTION_ID: &str = "current-situation";
/// Selector form of [`CURRENT_SECTION_ID`].
pub const CURRENT_SECTION_SELECTOR: &str = "#current-situation";

/// Document and engine operations consumed by situations.
pub trait System {
    /// Append markup as a new top-level block.
    fn write(&mut self, html: &str);
    /// Append markup inside the element matched by `selector`.
    fn write_into(&mut self, html: &str, selector: &str);
    /// Replace the element matched by `selector` with `html`.
    fn replace_with(&mut self, html: &str, selector: &str);
    /// Remove the `id` attribute from the element carrying it, if any.
    fn clear_id(&mut self, id: &str);
    /// Render a list of selectable situations.
    fn write_choices(&mut self, situation_ids: &[String]);
    /// Resolve situation names and `#tag` references into situation ids.
    fn get_situation_id_choices(
        &mut self,
        references: &[String],
        min_choices: Option<usize>,
        max_choices: Option<usize>,
    ) -> Vec<String>;
    /// Uniform random number in `[0, 1)` from the story's generator.
    fn random(&mut self) -> f64;
}
