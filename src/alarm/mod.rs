//! Alert templating and dispatch.
//!
//! This module turns event records into feed posts. The system consists of these
//! components:
//!
//! - [`EventContext`]: Placeholder values of one event
//! - [`resolve`]: Single-pass substitution of `<identifier>` placeholders
//! - [`AlertProfile`]: The templates of one event kind, built once from the configuration
//! - [`Dispatcher`]: Resolves profiles and publishes posts with one reconnect on stale sessions
//! - [`FeedAlarm`]: One entry point per event kind, bound to a page feed
//!
//! # Data Flow
//!
//! ```text
//! EventContext ─┐
//!               ├─► resolve ─► FeedPayload ─► Dispatcher ─► FeedClient
//! AlertProfile ─┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use pokefeed::alarm::{EventContext, FeedAlarm};
//! # use pokefeed::config::AlarmSettings;
//! # use pokefeed::feed::GraphClient;
//!
//! # async fn example(settings: AlarmSettings, graph_client: GraphClient) -> anyhow::Result<()> {
//! let alarm = FeedAlarm::new(&settings, graph_client, "alarms[0]")?;
//!
//! let context = EventContext::new()
//!     .with("old_team", "Mystic")
//!     .with("new_team", "Valor");
//! alarm.gym_alert(&context).await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod dispatcher;
mod feed_alarm;
mod profile;
mod template;

use thiserror::Error;

pub use crate::alarm::context::EventContext;
pub use crate::alarm::dispatcher::Dispatcher;
pub use crate::alarm::feed_alarm::FeedAlarm;
pub use crate::alarm::profile::{AlertKind, AlertProfile};
#[cfg(test)]
pub use crate::alarm::profile::AlertTemplates;
pub use crate::alarm::template::{placeholders, resolve};

/// Errors returned when a post could not be delivered.
///
/// Dispatch errors only concern the post at hand. The caller decides whether to
/// drop the event, queue it again or alert an operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No session could be opened with the feed provider.
    #[error("could not connect to the feed: {0}")]
    Connection(String),
    /// The post failed again after reconnecting.
    #[error("post failed after reconnecting: {0}")]
    Exhausted(String),
    /// The provider refused the post; retrying would not help.
    #[error("post rejected: {0}")]
    Rejected(String),
}
