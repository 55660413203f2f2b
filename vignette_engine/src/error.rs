//! Error taxonomy for situation dispatch and story hosting.
//!
//! Every variant is an authoring bug or a host misuse rather than a transient
//! condition, so nothing here is retried or recovered inside the engine.

use thiserror::Error;

/// Result type used throughout the situation core.
pub type SituationResult<T> = Result<T, SituationError>;

/// Errors raised while registering, entering, or acting in situations.
#[derive(Debug, Error)]
pub enum SituationError {
    #[error("tried to call undefined writer '{token}' in situation '{situation}'")]
    UndefinedWriter { situation: String, token: String },
    #[error("tried to call undefined action '{token}' in situation '{situation}'")]
    UndefinedAction { situation: String, token: String },
    #[error("{field} of situation '{situation}' must be text, found {found}")]
    InvalidContentType {
        situation: String,
        field: String,
        found: String,
    },
    #[error("empty action token sent to situation '{situation}'")]
    MalformedToken { situation: String },
    #[error("situation name '{name}' {problem}")]
    InvalidSituationName { name: String, problem: &'static str },
    #[error("situation '{0}' is already defined")]
    DuplicateSituation(String),
    #[error("no situation named '{0}'")]
    UnknownSituation(String),
    #[error("situation '{situation}' offers a choice of unknown situation '{target}'")]
    UnknownChoiceTarget { situation: String, target: String },
    #[error("no situation has been entered yet")]
    NoCurrentSituation,
    #[error("no live link with href '{0}' in the view")]
    MissingLink(String),
    #[error("{hook} hook of situation '{situation}' failed")]
    HookFailed {
        situation: String,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("action '{action}' of situation '{situation}' failed")]
    ActionFailed {
        situation: String,
        action: String,
        #[source]
        source: anyhow::Error,
    },
}
