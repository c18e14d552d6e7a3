//! Placeholder substitution for alert templates.
//!
//! Templates carry `<identifier>` tokens, e.g. `"A wild <pkmn> has appeared!"`.
//! [`resolve`] replaces the tokens known to an [`EventContext`] and keeps the others
//! as written, so one default template can serve events that fill in different
//! subsets of identifiers.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::alarm::EventContext;

/// A `<`, one or more characters other than angle brackets, then `>`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>]+)>").expect("placeholder pattern is valid"));

/// Substitutes every placeholder of `template` found in `context`.
///
/// The template is scanned once from left to right. Inserted values are copied
/// verbatim and never scanned again, so a value that looks like a placeholder
/// (`"<b>"`) ends up in the output as is. Unknown placeholders are left untouched.
///
/// # Examples
///
/// ```
/// # use pokefeed::alarm::{EventContext, resolve};
/// let context = EventContext::new().with("pkmn", "Snorlax");
/// assert_eq!(resolve("<pkmn> until <24h_time>", &context), "Snorlax until <24h_time>");
/// ```
pub fn resolve(template: &str, context: &EventContext) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match context.get(&caps[1]) {
            Some(value) => value.to_owned(),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

/// Lists the placeholder identifiers referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|identifier| identifier.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting_context() -> EventContext {
        EventContext::new()
            .with("pkmn", "Snorlax")
            .with("gmaps", "http://maps.google.com/?q=1,2")
            .with("id", "143")
    }

    #[test]
    fn test_resolve_all_known_placeholders() {
        let resolved = resolve("<pkmn> at <gmaps>", &sighting_context());

        assert_eq!(resolved, "Snorlax at http://maps.google.com/?q=1,2");
        assert!(placeholders(&resolved).is_empty());
    }

    #[test]
    fn test_resolve_keeps_unknown_placeholders() {
        let resolved = resolve(
            "A Team <old_team> gym has fallen near <pkmn>!",
            &sighting_context(),
        );

        assert_eq!(resolved, "A Team <old_team> gym has fallen near Snorlax!");
    }

    #[test]
    fn test_resolve_does_not_rescan_values() {
        let context = EventContext::new().with("a", "<b>").with("b", "X");

        assert_eq!(resolve("<a>", &context), "<b>");
        assert_eq!(resolve("<a><b>", &context), "<b>X");
    }

    #[test]
    fn test_resolve_repeated_placeholder() {
        let resolved = resolve("<pkmn>, <pkmn>!", &sighting_context());

        assert_eq!(resolved, "Snorlax, Snorlax!");
    }

    #[test]
    fn test_resolve_ignores_stray_brackets() {
        let resolved = resolve("a < b <pkmn> > c <>", &sighting_context());

        assert_eq!(resolved, "a < b Snorlax > c <>");
    }

    #[test]
    fn test_resolve_without_placeholders() {
        let resolved = resolve("Gym Change", &sighting_context());

        assert_eq!(resolved, "Gym Change");
    }

    #[test]
    fn test_resolve_with_empty_context() {
        let template = "<pkmn> until <24h_time> (<time_left>)";

        assert_eq!(resolve(template, &EventContext::new()), template);
    }

    #[test]
    fn test_resolve_inserts_special_characters_verbatim() {
        let context = EventContext::new().with("address", "$1 Rue & <Co>");

        assert_eq!(resolve("at <address>", &context), "at $1 Rue & <Co>");
    }

    #[test]
    fn test_placeholders_in_order() {
        let found = placeholders("<pkmn> at <address> <city> until <24h_time>");

        assert_eq!(found, vec!["pkmn", "address", "city", "24h_time"]);
    }
}
