//! Alert profiles: the templates used for one kind of event.
//!
//! A profile is built once per alarm and per [`AlertKind`] by overlaying the user
//! overrides of the configuration on the built-in default copy of that kind.

use std::{collections::HashMap, fmt};

use serde::Deserialize;

use crate::config::ConfigError;

/// Kind of event an alert is sent for.
///
/// Event lines name kinds after the game object (`pokemon`, `pokestop`, `gym`);
/// configuration sections use [`AlertKind::section`] (`sighting`, `lure`,
/// `control_change`). Both spellings are accepted when deserializing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum AlertKind {
    /// A wild pokemon appeared.
    #[serde(rename = "pokemon", alias = "sighting")]
    Sighting,
    /// A lure was placed on a pokestop.
    #[serde(rename = "pokestop", alias = "lure")]
    LureEvent,
    /// A gym changed team.
    #[serde(rename = "gym", alias = "control_change")]
    ControlChange,
}

impl AlertKind {
    /// Name of the override block of this kind in an alarm configuration.
    pub fn section(self) -> &'static str {
        match self {
            AlertKind::Sighting => "sighting",
            AlertKind::LureEvent => "lure",
            AlertKind::ControlChange => "control_change",
        }
    }

    /// Built-in alert copy of this kind.
    pub fn default_templates(self) -> AlertTemplates {
        match self {
            AlertKind::Sighting => AlertTemplates::new(
                "A wild <pkmn> has appeared! Catch it at <address> <city>. Available until <24h_time> (<time_left>).",
                "<gmaps>",
                "https://raw.githubusercontent.com/brusselopole/Worldopole/master/core/pokemons/<id>.png",
                "<pkmn>",
            ),
            AlertKind::LureEvent => AlertTemplates::new(
                "Someone has placed a lure on a Pokestop! Lure will expire at <24h_time> (<time_left>).",
                "<gmaps>",
                "https://raw.githubusercontent.com/brusselopole/Worldopole/master/core/img/pokestop.png",
                "Pokestop Lure",
            ),
            AlertKind::ControlChange => AlertTemplates::new(
                "A Team <old_team> gym has fallen! It is now controlled by <new_team>.",
                "<gmaps>",
                "https://raw.githubusercontent.com/brusselopole/Worldopole/master/core/img/<new_team>.png",
                "Gym Change",
            ),
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AlertKind::Sighting => "pokemon",
            AlertKind::LureEvent => "pokestop",
            AlertKind::ControlChange => "gym",
        };
        write!(f, "{}", name)
    }
}

/// The four templated fields of a feed post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertTemplates {
    /// Body of the post
    pub message: String,
    /// Link attached to the post
    pub link: String,
    /// Picture url of the link preview
    pub title: String,
    /// Name of the link preview
    pub name: String,
}

impl AlertTemplates {
    /// Creates templates from the four field templates.
    pub fn new(message: &str, link: &str, title: &str, name: &str) -> Self {
        AlertTemplates {
            message: message.to_owned(),
            link: link.to_owned(),
            title: title.to_owned(),
            name: name.to_owned(),
        }
    }
}

/// Templates bound to an event kind.
///
/// Fields are private: once built, a profile stays the same for the lifetime of
/// the alarm that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertProfile {
    kind: AlertKind,
    templates: AlertTemplates,
}

impl AlertProfile {
    /// Builds the profile of `kind` from the configuration `overrides`.
    ///
    /// Each field is taken from `overrides` when present, from `defaults` otherwise.
    /// Keys other than `message`, `link`, `title` and `name` are most likely typos
    /// and make the whole block invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKeys`] naming `section` and the sorted leftover keys.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::HashMap;
    /// # use pokefeed::alarm::{AlertKind, AlertProfile};
    /// let overrides = HashMap::from([("name".to_string(), "<pkmn> spotted".to_string())]);
    /// let profile = AlertProfile::build(
    ///     AlertKind::Sighting,
    ///     &overrides,
    ///     &AlertKind::Sighting.default_templates(),
    ///     "alarms[0].sighting",
    /// )?;
    /// assert_eq!(profile.name(), "<pkmn> spotted");
    /// # Ok::<(), pokefeed::config::ConfigError>(())
    /// ```
    pub fn build(
        kind: AlertKind,
        overrides: &HashMap<String, String>,
        defaults: &AlertTemplates,
        section: &str,
    ) -> Result<Self, ConfigError> {
        let mut remaining = overrides.clone();
        let mut take =
            |field: &str, default: &str| remaining.remove(field).unwrap_or_else(|| default.to_owned());

        let templates = AlertTemplates {
            message: take("message", &defaults.message),
            link: take("link", &defaults.link),
            title: take("title", &defaults.title),
            name: take("name", &defaults.name),
        };

        if !remaining.is_empty() {
            let mut keys: Vec<String> = remaining.into_keys().collect();
            keys.sort();
            return Err(ConfigError::UnknownKeys {
                section: section.to_owned(),
                keys,
            });
        }

        Ok(AlertProfile { kind, templates })
    }

    /// Kind of event the profile is used for.
    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    /// Template of the post body.
    pub fn message(&self) -> &str {
        &self.templates.message
    }

    /// Template of the attached link.
    pub fn link(&self) -> &str {
        &self.templates.link
    }

    /// Template of the link preview picture url.
    pub fn title(&self) -> &str {
        &self.templates.title
    }

    /// Template of the link preview name.
    pub fn name(&self) -> &str {
        &self.templates.name
    }
}
