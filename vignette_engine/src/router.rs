//! Action routing.
//!
//! Decodes an action token (see [`crate::link`]) and performs the response it
//! names against the situation that owns the clicked link:
//!
//! - **writer**: render the writer as block markdown and append it to the current section
//! - **replacer**: render the writer inline and replace the element whose id is the reference
//! - **inserter**: render the writer inline and append it inside that element
//! - **action**: call the situation's handler for the token
//!
//! Lookups are exact and never fall back from one namespace to the other.
//! The router holds no state; retiring a "once" link after its first click is
//! the host's concern.

use log::debug;

use crate::error::{SituationError, SituationResult};
use crate::link::{LinkAddress, LinkKind, decode};
use crate::markup::{render, render_inline};
use crate::situation::Situation;
use crate::system::{CURRENT_SECTION_SELECTOR, System};
use crate::text::{fade, normalize_tabs, span_wrap};

/// Dispatch `token` within `situation`.
///
/// # Errors
/// - `MalformedToken` for an empty token
/// - `UndefinedWriter` if a writer/replacer/inserter reference is not among the situation's writers
/// - `UndefinedAction` if a direct action is not among the situation's actions
/// - `ActionFailed` if the action handler returns an error
pub fn dispatch<C>(situation: &Situation<C>, actor: &mut C, system: &mut dyn System, token: &str) -> SituationResult<()> {
    let Some(address) = decode(token) else {
        return Err(SituationError::MalformedToken {
            situation: situation.name().to_string(),
        });
    };
    debug!("situation '{}' dispatching {} '{}'", situation.name(), address.kind, address.reference);

    match address.kind {
        LinkKind::Action => run_action(situation, actor, system, token),
        LinkKind::Writer => {
            let text = writer_text(situation, actor, system, token, &address)?;
            let html = fade(&render(&normalize_tabs(&text)));
            system.write_into(&html, CURRENT_SECTION_SELECTOR);
            Ok(())
        },
        LinkKind::Replacer => {
            let text = writer_text(situation, actor, system, token, &address)?;
            let html = fade(&span_wrap(&render_inline(&text)));
            system.replace_with(&html, &format!("#{}", address.reference));
            Ok(())
        },
        LinkKind::Inserter => {
            let text = writer_text(situation, actor, system, token, &address)?;
            let html = fade(&span_wrap(&render_inline(&text)));
            system.write_into(&html, &format!("#{}", address.reference));
            Ok(())
        },
    }
}

fn run_action<C>(situation: &Situation<C>, actor: &mut C, system: &mut dyn System, token: &str) -> SituationResult<()> {
    let handler = situation.action(token).ok_or_else(|| SituationError::UndefinedAction {
        situation: situation.name().to_string(),
        token: token.to_string(),
    })?;
    handler(situation, actor, system, token).map_err(|source| SituationError::ActionFailed {
        situation: situation.name().to_string(),
        action: token.to_string(),
        source,
    })
}

/// Look up and resolve the writer a special link refers to. The clicked token is the provenance.
fn writer_text<C>(
    situation: &Situation<C>,
    actor: &mut C,
    system: &mut dyn System,
    token: &str,
    address: &LinkAddress,
) -> SituationResult<String> {
    let source = situation
        .writer(&address.reference)
        .ok_or_else(|| SituationError::UndefinedWriter {
            situation: situation.name().to_string(),
            token: token.to_string(),
        })?;
    Ok(source.resolve(situation, actor, system, Some(token)))
}
