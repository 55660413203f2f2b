use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Characters a situation name may not contain. Names become link hrefs
/// (`name`, `name/token`) and element classes, so these would break routing or markup.
pub const RESERVED_NAME_CHARS: &[char] = &['/', '#', '"', '\'', '<', '>', '&'];

/// Why `name` can't be used as a situation name, or `None` if it can.
///
/// ```
/// use vignette_data::validate::name_problem;
///
/// assert_eq!(name_problem("cellar-2"), None);
/// assert_eq!(name_problem("up/down"), Some("contains a reserved character"));
/// ```
pub fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("is empty")
    } else if name.chars().any(char::is_whitespace) {
        Some("contains whitespace")
    } else if name.contains(RESERVED_NAME_CHARS) {
        Some("contains a reserved character")
    } else {
        None
    }
}

/// A problem found in a story file before any situation is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    BadName { name: String, problem: &'static str },
    Redefined(String),
    UnknownStart(String),
    UnknownChoice { situation: String, target: String },
    EmptyTag { situation: String },
    InvertedBounds { situation: String, min: usize, max: usize },
    BadClass { situation: String, class: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadName { name, problem } => write!(f, "situation name '{name}' {problem}"),
            Self::Redefined(name) => write!(f, "situation '{name}' is defined more than once"),
            Self::UnknownStart(name) => write!(f, "start situation '{name}' does not exist"),
            Self::UnknownChoice { situation, target } => {
                write!(f, "'{situation}' offers '{target}', which does not exist")
            },
            Self::EmptyTag { situation } => write!(f, "'{situation}' offers an empty '#' tag"),
            Self::InvertedBounds { situation, min, max } => {
                write!(f, "'{situation}' asks for at least {min} but at most {max} choices")
            },
            Self::BadClass { situation, class } => {
                write!(f, "'{situation}' has class '{class}', which is not a single class name")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check the situation names of a story and every name it refers to.
///
/// Text values are not checked here; the engine reports non-text content when it
/// builds the situation, where it can name the offending field.
///
/// ```
/// use vignette_data::{SituationDef, StoryDef, StoryMeta, validate_story};
///
/// let story = StoryDef {
///     story: StoryMeta {
///         title: "Demo".into(),
///         ..StoryMeta::default()
///     },
///     situations: vec![SituationDef {
///         name: "start".into(),
///         ..SituationDef::default()
///     }],
/// };
/// assert!(validate_story(&story).is_empty());
/// ```
pub fn validate_story(story: &StoryDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut known: HashSet<&str> = HashSet::new();

    for situation in &story.situations {
        let name = situation.name.as_str();
        if let Some(problem) = name_problem(name) {
            errors.push(ValidationError::BadName {
                name: name.to_string(),
                problem,
            });
        } else if !known.insert(name) {
            errors.push(ValidationError::Redefined(name.to_string()));
        }
    }

    if !known.contains(story.story.start.as_str()) {
        errors.push(ValidationError::UnknownStart(story.story.start.clone()));
    }

    for situation in &story.situations {
        let here = || situation.name.clone();

        for target in situation.choices.iter().flatten() {
            match target.strip_prefix('#') {
                Some(tag) if tag.trim().is_empty() => errors.push(ValidationError::EmptyTag { situation: here() }),
                Some(_) => {},
                None if known.contains(target.as_str()) => {},
                None => errors.push(ValidationError::UnknownChoice {
                    situation: here(),
                    target: target.clone(),
                }),
            }
        }

        if let (Some(min), Some(max)) = (situation.min_choices, situation.max_choices)
            && min > max
        {
            errors.push(ValidationError::InvertedBounds {
                situation: here(),
                min,
                max,
            });
        }

        errors.extend(
            situation
                .classes
                .iter()
                .filter(|class| class.is_empty() || class.chars().any(char::is_whitespace))
                .map(|class| ValidationError::BadClass {
                    situation: here(),
                    class: class.clone(),
                }),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn situation(name: &str) -> SituationDef {
        SituationDef {
            name: name.to_string(),
            content: Some(TextDef::from("text")),
            ..SituationDef::default()
        }
    }

    fn base_story() -> StoryDef {
        StoryDef {
            story: StoryMeta {
                title: "Demo".into(),
                ..StoryMeta::default()
            },
            situations: vec![situation("start")],
        }
    }

    #[test]
    fn valid_story_has_no_errors() {
        let mut story = base_story();
        let mut next = situation("next");
        next.choices = Some(vec!["start".into(), "#anywhere".into()]);
        story.situations.push(next);
        assert!(validate_story(&story).is_empty());
    }

    #[test]
    fn redefinitions_are_reported_once() {
        let mut story = base_story();
        story.situations.push(situation("start"));
        let errors = validate_story(&story);
        assert_eq!(errors, vec![ValidationError::Redefined("start".into())]);
        assert_eq!(errors[0].to_string(), "situation 'start' is defined more than once");
    }

    #[test]
    fn missing_start_and_choice_targets_are_reported() {
        let mut story = base_story();
        story.story.start = "prologue".into();
        story.situations[0].choices = Some(vec!["nowhere".into(), "#".into()]);
        let errors = validate_story(&story);
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownStart("prologue".into()),
                ValidationError::UnknownChoice {
                    situation: "start".into(),
                    target: "nowhere".into()
                },
                ValidationError::EmptyTag {
                    situation: "start".into()
                },
            ]
        );
    }

    #[test]
    fn inverted_choice_bounds_are_reported() {
        let mut story = base_story();
        story.situations[0].min_choices = Some(3);
        story.situations[0].max_choices = Some(1);
        let errors = validate_story(&story);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "'start' asks for at least 3 but at most 1 choices");
    }

    #[test]
    fn classes_must_be_single_names() {
        let mut story = base_story();
        story.situations[0].classes = vec!["ok".into(), "two words".into()];
        let errors = validate_story(&story);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("two words"));
    }

    #[test]
    fn names_that_would_break_links_are_rejected() {
        let mut story = base_story();
        for name in ["", "a b", "x\"onclick", "up/down", "#tag"] {
            story.situations.push(situation(name));
        }
        let problems: Vec<_> = validate_story(&story)
            .into_iter()
            .filter_map(|error| match error {
                ValidationError::BadName { name, problem } => Some((name, problem)),
                _ => None,
            })
            .collect();
        assert_eq!(
            problems,
            vec![
                (String::new(), "is empty"),
                ("a b".to_string(), "contains whitespace"),
                ("x\"onclick".to_string(), "contains a reserved character"),
                ("up/down".to_string(), "contains a reserved character"),
                ("#tag".to_string(), "contains a reserved character"),
            ]
        );
    }
}
