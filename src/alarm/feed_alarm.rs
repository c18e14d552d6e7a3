//! Alarm publishing one page feed.
//!
//! This module provides the [`FeedAlarm`] struct, the entry point of the alarm
//! system: one method per event kind, each binding the profile of that kind to the
//! alarm's [`Dispatcher`].

use chrono::{Local, NaiveDateTime};
use log::{info, warn};

use crate::{
    alarm::{AlertKind, AlertProfile, DispatchError, Dispatcher, EventContext, resolve},
    config::{AlarmSettings, ConfigError},
    feed::FeedClient,
    utils::time_context,
};

/// Announcement posted when the alarm starts.
const STARTUP_TEMPLATE: &str = "<24h_time> - PokeAlarm has initialized!";

/// Alarm posting alerts on a single page feed.
///
/// The three profiles are built once from the alarm settings and never change
/// afterwards; changing the copy means building a new alarm.
///
/// # Examples
///
/// ```no_run
/// # use pokefeed::alarm::{EventContext, FeedAlarm};
/// # use pokefeed::config::AlarmSettings;
/// # use pokefeed::feed::GraphClient;
/// # async fn example(settings: AlarmSettings, graph_client: GraphClient) -> anyhow::Result<()> {
/// let alarm = FeedAlarm::new(&settings, graph_client, "alarms[0]")?;
/// alarm.startup_message().await;
///
/// let context = EventContext::new().with("pkmn", "Snorlax").with("id", "143");
/// alarm.pokemon_alert(&context).await?;
/// # Ok(())
/// # }
/// ```
pub struct FeedAlarm<C: FeedClient> {
    /// Configuration section the alarm was built from, e.g. `alarms[0]`
    name: String,
    /// Profile of pokemon sightings
    pokemon: AlertProfile,
    /// Profile of pokestop lures
    pokestop: AlertProfile,
    /// Profile of gym control changes
    gym: AlertProfile,
    /// Whether to post an announcement at startup
    announce_on_startup: bool,
    dispatcher: Dispatcher<C>,
}

impl<C: FeedClient> FeedAlarm<C> {
    /// Creates an alarm from its settings.
    ///
    /// # Arguments
    ///
    /// * `settings` - The validated settings of the alarm
    /// * `client` - Feed client owned by this alarm
    /// * `section` - Configuration section of the alarm, used in error messages
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if the credential is blank
    /// - [`ConfigError::UnknownKeys`] if an override block has unknown keys
    pub fn new(settings: &AlarmSettings, client: C, section: &str) -> Result<Self, ConfigError> {
        if settings.credential.trim().is_empty() {
            return Err(ConfigError::MissingField {
                section: section.to_owned(),
                field: "credential".to_owned(),
            });
        }

        let build = |kind: AlertKind| {
            AlertProfile::build(
                kind,
                settings.overrides(kind),
                &kind.default_templates(),
                &format!("{}.{}", section, kind.section()),
            )
        };

        let alarm = FeedAlarm {
            name: section.to_owned(),
            pokemon: build(AlertKind::Sighting)?,
            pokestop: build(AlertKind::LureEvent)?,
            gym: build(AlertKind::ControlChange)?,
            announce_on_startup: settings.announce_on_startup,
            dispatcher: Dispatcher::new(client, &settings.credential, settings.target()),
        };

        info!(
            "feed alarm {} has been created for page {}",
            alarm.name,
            alarm.dispatcher.target().page_id
        );

        Ok(alarm)
    }

    /// Returns the configuration section the alarm was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the profile used for `kind` alerts.
    #[cfg(test)]
    pub fn profile(&self, kind: AlertKind) -> &AlertProfile {
        match kind {
            AlertKind::Sighting => &self.pokemon,
            AlertKind::LureEvent => &self.pokestop,
            AlertKind::ControlChange => &self.gym,
        }
    }

    /// Posts the alert of `kind` resolved with `context`.
    pub async fn alert(&self, kind: AlertKind, context: &EventContext) -> Result<(), DispatchError> {
        match kind {
            AlertKind::Sighting => self.pokemon_alert(context).await,
            AlertKind::LureEvent => self.pokestop_alert(context).await,
            AlertKind::ControlChange => self.gym_alert(context).await,
        }
    }

    /// Posts a pokemon sighting alert.
    pub async fn pokemon_alert(&self, context: &EventContext) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(&self.pokemon, context).await
    }

    /// Posts a pokestop lure alert.
    pub async fn pokestop_alert(&self, context: &EventContext) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(&self.pokestop, context).await
    }

    /// Posts a gym control change alert.
    pub async fn gym_alert(&self, context: &EventContext) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(&self.gym, context).await
    }

    /// Posts the startup announcement if enabled.
    ///
    /// The announcement is informational: a failure is logged, never returned.
    /// Returns whether an announcement was posted.
    pub async fn startup_message(&self) -> bool {
        self.announce_at(Local::now().naive_local()).await
    }

    async fn announce_at(&self, now: NaiveDateTime) -> bool {
        if !self.announce_on_startup {
            return false;
        }

        let message = resolve(STARTUP_TEMPLATE, &time_context(&now));
        match self.dispatcher.post_text(&message).await {
            Ok(()) => {
                info!("startup message of {} sent", self.name);
                true
            }
            Err(e) => {
                warn!("failed to send startup message of {}: {}", self.name, e);
                false
            }
        }
    }
}
