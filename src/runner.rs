//! Runner feeding event records to the configured alarms.
//!
//! This module provides the [`Runner`] which owns every alarm of the configuration,
//! sends their startup announcements and dispatches incoming events to them.
//!
//! # Event Format
//!
//! Events are read as JSON lines, one event per line:
//!
//! ```text
//! {"kind": "pokemon", "context": {"pkmn": "Snorlax", "id": 143, "gmaps": "http://maps.google.com/maps?q=1,2"}}
//! {"kind": "pokestop", "context": {"24h_time": "14:32:05", "time_left": "29m 12s"}}
//! {"kind": "gym", "context": {"old_team": "Mystic", "new_team": "Valor"}}
//! ```
//!
//! Blank lines are ignored. Lines that are not valid events are logged and skipped.
//!
//! # Processing Flow
//!
//! ```text
//! Event line → Parse → for each alarm: FeedAlarm::alert → count delivered / failed
//! ```
//!
//! Events are handled one at a time and in order; a failed dispatch never stops
//! the runner.

use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    alarm::{AlertKind, EventContext, FeedAlarm},
    config::{Config, ConfigError},
    feed::FeedClient,
};

/// An event record read from the input stream.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Event {
    /// Kind of the event, selecting the alert profile
    pub kind: AlertKind,
    /// Placeholder values of the event
    #[serde(default)]
    pub context: EventContext,
}

/// Counters of a [`Runner::run`] session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Events read and dispatched
    pub events: usize,
    /// Posts delivered, one per event and alarm
    pub delivered: usize,
    /// Posts that could not be delivered
    pub failed: usize,
    /// Lines that were not valid events
    pub skipped: usize,
}

/// Owner of the configured alarms.
///
/// # Examples
///
/// ```no_run
/// # use pokefeed::config::Config;
/// # use pokefeed::feed::GraphClient;
/// # use pokefeed::runner::Runner;
/// # async fn example(config: Config, graph_client: GraphClient) -> anyhow::Result<()> {
/// let runner = Runner::new(&config, || graph_client.clone())?;
/// runner.announce().await;
///
/// let stdin = tokio::io::BufReader::new(tokio::io::stdin());
/// let stats = runner.run(stdin).await?;
/// println!("{} events, {} posts", stats.events, stats.delivered);
/// # Ok(())
/// # }
/// ```
pub struct Runner<C: FeedClient> {
    alarms: Vec<FeedAlarm<C>>,
}

impl<C: FeedClient> Runner<C> {
    /// Creates one alarm per valid alarm section of `config`.
    ///
    /// Each alarm gets its own client from `build_client`, so alarms never share a
    /// session. An invalid alarm is logged and left out; the others still start.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoAlarms`] if no alarm could be created.
    pub fn new<F>(config: &Config, mut build_client: F) -> Result<Self, ConfigError>
    where
        F: FnMut() -> C,
    {
        let mut alarms = Vec::new();

        for (section, settings) in config.alarm_settings() {
            let alarm = settings
                .and_then(|settings| FeedAlarm::new(&settings, build_client(), &section));
            match alarm {
                Ok(alarm) => alarms.push(alarm),
                Err(e) => {
                    error!("{}", e);
                    error!("please consult the documentation for accepted parameters");
                }
            }
        }

        if alarms.is_empty() {
            return Err(ConfigError::NoAlarms);
        }

        info!("{} alarm(s) ready", alarms.len());

        Ok(Runner { alarms })
    }

    #[cfg(test)]
    pub fn alarms(&self) -> &[FeedAlarm<C>] {
        &self.alarms
    }

    /// Sends the startup announcement of every alarm.
    ///
    /// Returns the number of announcements posted.
    pub async fn announce(&self) -> usize {
        join_all(self.alarms.iter().map(|alarm| alarm.startup_message()))
            .await
            .into_iter()
            .filter(|sent| *sent)
            .count()
    }

    /// Reads events from `reader` until the end of input and dispatches each of
    /// them to every alarm.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading from `reader` fails.
    pub async fn run<R>(&self, reader: R) -> std::io::Result<RunStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = RunStats::default();
        let mut lines = reader.lines();
        let mut line_number = 0;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let event: Event = match serde_json::from_str(line) {
                Ok(event) => event,
                Err(e) => {
                    warn!("skipping invalid event on line {}: {}", line_number, e);
                    stats.skipped += 1;
                    continue;
                }
            };

            self.handle_event(&event, &mut stats).await;
        }

        info!(
            "end of events: {} events, {} delivered, {} failed, {} skipped",
            stats.events, stats.delivered, stats.failed, stats.skipped
        );

        Ok(stats)
    }

    async fn handle_event(&self, event: &Event, stats: &mut RunStats) {
        debug!("{} event with {} values", event.kind, event.context.len());
        stats.events += 1;

        for alarm in &self.alarms {
            match alarm.alert(event.kind, &event.context).await {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    error!("{} alert of {} not delivered: {}", event.kind, alarm.name(), e);
                    stats.failed += 1;
                }
            }
        }
    }
}
