#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const VIGNETTE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Situation core
pub mod error;
pub mod link;
pub mod router;
pub mod situation;
pub mod source;
pub mod system;

// Text handling
pub mod markup;
pub mod text;

// Host side
pub mod choices;
pub mod loader;
pub mod registry;
pub mod story;
pub mod view;

// Re-exports for convenience
pub use choices::{ChoiceCatalog, ChoiceEntry};
pub use error::{SituationError, SituationResult};
pub use link::{LinkAddress, LinkKind};
pub use loader::{build_registry, build_registry_with, load_story, load_story_def, load_story_with};
pub use registry::SituationRegistry;
pub use situation::{Situation, SituationSpec};
pub use source::TextSource;
pub use story::{Host, Story, StoryConfig};
pub use system::System;
pub use view::View;
