//! Configuration file structures for pokefeed.
//!
//! This module defines the configuration file format using YAML. The configuration
//! is split into the Graph API settings and the list of alarms, each alarm posting
//! to one page feed.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Graph API settings (optional)
//! graph:
//!   url: "https://graph.facebook.com"
//!   timeout_secs: 30
//!
//! alarms:
//!   - # Page access token (required)
//!     credential: "page-access-token"
//!     # Post an announcement at startup
//!     announce_on_startup: true
//!     # Page whose feed receives the posts
//!     page_id: "157783561377843"
//!     caption: "Valor Boolopole"
//!     description: "Click to open google maps and precise location"
//!     # Per-kind overrides of `message`, `link`, `title` and `name`
//!     sighting:
//!       message: "<pkmn> until <24h_time> (<time_left>)"
//!     lure: {}
//!     control_change:
//!       name: "<new_team> took a gym"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Any value can be overridden with the `POKEFEED_` prefix, `__` separating levels:
//!
//! ```bash
//! export POKEFEED_GRAPH__TIMEOUT_SECS=10
//! ```
//!
//! # Validation
//!
//! Unknown keys are rejected at every level. The root and `graph` sections are
//! checked when loading. Alarms are checked one by one by [`Config::alarm_settings`]
//! so an invalid alarm does not prevent the others from starting.

use std::{collections::HashMap, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::{
    alarm::AlertKind,
    feed::{DEFAULT_CAPTION, DEFAULT_DESCRIPTION, DEFAULT_PAGE_ID, FeedTarget},
};

/// Default Graph API base url.
const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
/// Default timeout of Graph API requests, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors found while loading or validating the configuration.
///
/// These errors are fatal for what they concern: the whole process when the file
/// cannot be loaded, a single alarm otherwise.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or does not match the expected structure.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    /// An alarm section does not match the expected structure.
    #[error("invalid settings at {section}: {source}")]
    Invalid {
        section: String,
        #[source]
        source: serde_json::Error,
    },
    /// A required value is missing or blank.
    #[error("the parameter '{field}' is required at {section}")]
    MissingField { section: String, field: String },
    /// An override block has keys other than the four templated fields.
    #[error("unknown parameters at {section}: {}", keys.join(", "))]
    UnknownKeys { section: String, keys: Vec<String> },
    /// Not a single alarm could be created.
    #[error("no alarm could be created from the configuration")]
    NoAlarms,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```no_run
/// # use pokefeed::config::Config;
/// let config = Config::load("config.yaml")?;
/// for (section, settings) in config.alarm_settings() {
///     println!("{}: {:?}", section, settings.map(|s| s.page_id));
/// }
/// # Ok::<(), pokefeed::config::ConfigError>(())
/// ```
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Graph API settings
    #[serde(default)]
    pub graph: Graph,
    /// Raw alarm sections, validated by [`Config::alarm_settings`]
    #[serde(default)]
    pub alarms: Vec<Value>,
}

/// Graph API settings.
///
/// ```yaml
/// graph:
///   url: "https://graph.facebook.com/v2.8"
///   timeout_secs: 30
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Graph {
    /// Base URL of the Graph API, optionally with a version segment.
    #[serde(default = "default_graph_url")]
    pub url: String,
    /// Timeout of every request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Graph {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph {
            url: default_graph_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings of one alarm.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AlarmSettings {
    /// Page access token used to open sessions with the Graph API.
    pub credential: String,
    /// Whether to post an announcement at startup.
    ///
    /// Accepts booleans and the strings `t`, `true`, `y`, `yes`, `f`, `false`,
    /// `n`, `no` in any case.
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub announce_on_startup: bool,
    /// Page whose feed receives the posts.
    #[serde(default = "default_page_id")]
    pub page_id: String,
    /// Caption of the link previews.
    #[serde(default = "default_caption")]
    pub caption: String,
    /// Description of the link previews.
    #[serde(default = "default_description")]
    pub description: String,
    /// Overrides of the pokemon sighting templates.
    #[serde(default)]
    pub sighting: HashMap<String, String>,
    /// Overrides of the pokestop lure templates.
    #[serde(default)]
    pub lure: HashMap<String, String>,
    /// Overrides of the gym control change templates.
    #[serde(default)]
    pub control_change: HashMap<String, String>,
}

impl AlarmSettings {
    /// Returns the override block of `kind`.
    pub fn overrides(&self, kind: AlertKind) -> &HashMap<String, String> {
        match kind {
            AlertKind::Sighting => &self.sighting,
            AlertKind::LureEvent => &self.lure,
            AlertKind::ControlChange => &self.control_change,
        }
    }

    /// Returns the destination of the alarm's posts.
    pub fn target(&self) -> FeedTarget {
        FeedTarget {
            page_id: self.page_id.clone(),
            caption: self.caption.clone(),
            description: self.description.clone(),
        }
    }
}

impl Default for AlarmSettings {
    fn default() -> Self {
        AlarmSettings {
            credential: String::new(),
            announce_on_startup: true,
            page_id: default_page_id(),
            caption: default_caption(),
            description: default_description(),
            sighting: HashMap::new(),
            lure: HashMap::new(),
            control_change: HashMap::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a YAML file, then applies `POKEFEED_` environment
    /// variables on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file is missing, is not valid YAML or has
    /// unknown keys at the root or `graph` levels.
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        let config = Figment::new()
            .merge(Yaml::file_exact(path))
            .merge(Env::prefixed("POKEFEED_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Validates every alarm section.
    ///
    /// Returns, in configuration order, the section name (`alarms[0]`, ...) of each
    /// alarm with its settings or the reason it is invalid.
    pub fn alarm_settings(&self) -> Vec<(String, Result<AlarmSettings, ConfigError>)> {
        self.alarms
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let section = format!("alarms[{}]", index);
                let settings = serde_json::from_value(raw.clone()).map_err(|source| {
                    ConfigError::Invalid {
                        section: section.clone(),
                        source,
                    }
                });
                (section, settings)
            })
            .collect()
    }
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_page_id() -> String {
    DEFAULT_PAGE_ID.to_owned()
}

fn default_caption() -> String {
    DEFAULT_CAPTION.to_owned()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_owned()
}

/// Reads a boolean written either as a YAML boolean or as a yes/no word.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => Ok(flag),
        Flag::Text(text) => match text.to_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Ok(true),
            "f" | "false" | "n" | "no" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "expected a boolean, found '{}'",
                text
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn load(content: &str) -> Result<Config, ConfigError> {
        let file = write_config(content);
        Config::load(file.path().to_str().unwrap())
    }

    #[test]
    #[serial]
    fn test_load_full_config() {
        let config = load(
            r#"
graph:
  url: "http://localhost:8080"
  timeout_secs: 5
alarms:
  - credential: "token"
    announce_on_startup: false
    page_id: "42"
    sighting:
      message: "<pkmn> spotted"
"#,
        )
        .unwrap();

        assert_eq!(config.graph.url, "http://localhost:8080");
        assert_eq!(config.graph.timeout(), Duration::from_secs(5));

        let alarms = config.alarm_settings();
        assert_eq!(alarms.len(), 1);
        let (section, settings) = &alarms[0];
        let settings = settings.as_ref().unwrap();
        assert_eq!(section, "alarms[0]");
        assert_eq!(settings.credential, "token");
        assert!(!settings.announce_on_startup);
        assert_eq!(settings.target().page_id, "42");
        assert_eq!(settings.caption, DEFAULT_CAPTION);
        assert_eq!(
            settings.overrides(AlertKind::Sighting).get("message").unwrap(),
            "<pkmn> spotted"
        );
        assert!(settings.overrides(AlertKind::LureEvent).is_empty());
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let config = load("alarms:\n  - credential: \"token\"\n").unwrap();

        assert_eq!(config.graph, Graph::default());

        let (_, settings) = config.alarm_settings().remove(0);
        let settings = settings.unwrap();
        assert!(settings.announce_on_startup);
        assert_eq!(settings.target(), FeedTarget::default());
    }

    #[test]
    #[serial]
    fn test_load_missing_file() {
        let result = Config::load("does/not/exist.yaml");

        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    #[serial]
    fn test_load_rejects_unknown_root_key() {
        let result = load("alarms: []\nalarmz: []\n");

        let error = result.unwrap_err();
        assert!(matches!(error, ConfigError::Load(_)));
        assert!(error.to_string().contains("alarmz"));
    }

    #[test]
    #[serial]
    fn test_load_rejects_unknown_graph_key() {
        let result = load("graph:\n  timeout: 5\n");

        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = write_config("graph:\n  timeout_secs: 30\n");
        // SAFETY: tests touching the environment run serially
        unsafe { std::env::set_var("POKEFEED_GRAPH__TIMEOUT_SECS", "7") };

        let result = Config::load(file.path().to_str().unwrap());

        unsafe { std::env::remove_var("POKEFEED_GRAPH__TIMEOUT_SECS") };
        assert_eq!(result.unwrap().graph.timeout_secs, 7);
    }

    #[test]
    fn test_alarm_settings_isolates_invalid_alarms() {
        let config = Config {
            graph: Graph::default(),
            alarms: vec![
                json!({"credential": "token", "bogus": true}),
                json!({"announce_on_startup": true}),
                json!({"credential": "other"}),
            ],
        };

        let alarms = config.alarm_settings();

        match &alarms[0].1 {
            Err(ConfigError::Invalid { section, source }) => {
                assert_eq!(section, "alarms[0]");
                assert!(source.to_string().contains("bogus"));
            }
            other => panic!("expected invalid settings, got {:?}", other),
        }
        match &alarms[1].1 {
            Err(e) => assert!(e.to_string().contains("credential")),
            Ok(_) => panic!("alarm without credential accepted"),
        }
        assert_eq!(alarms[2].1.as_ref().unwrap().credential, "other");
    }

    #[test]
    fn test_announce_on_startup_accepts_words() {
        for (raw, expected) in [("True", true), ("yes", true), ("n", false), ("FALSE", false)] {
            let settings: AlarmSettings =
                serde_json::from_value(json!({"credential": "token", "announce_on_startup": raw}))
                    .unwrap();
            assert_eq!(settings.announce_on_startup, expected, "{}", raw);
        }

        let result: Result<AlarmSettings, _> =
            serde_json::from_value(json!({"credential": "token", "announce_on_startup": "maybe"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_override_values_must_be_strings() {
        let result: Result<AlarmSettings, _> =
            serde_json::from_value(json!({"credential": "token", "sighting": {"message": ["a"]}}));

        assert!(result.is_err());
    }
}
