//! Resolution and guarded delivery of alert posts.
//!
//! This module provides the [`Dispatcher`] which turns an [`AlertProfile`] and an
//! [`EventContext`] into a [`FeedPayload`] and publishes it, reconnecting once when
//! the session turns out to be stale.

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::{
    alarm::{AlertProfile, DispatchError, EventContext, placeholders, resolve},
    feed::{FeedClient, FeedConnection, FeedPayload, FeedTarget},
};

/// Publishes alert posts through a [`FeedClient`].
///
/// The dispatcher owns the session with the provider. The session is opened lazily
/// on the first post, kept while posts succeed, and dropped when the provider
/// reports a transient failure.
///
/// # Thread Safety
///
/// The session slot is locked for the whole send, from the absence check to the
/// invalidation on failure, so concurrent dispatches on the same alarm never race
/// on reconnecting.
///
/// # Examples
///
/// ```no_run
/// # use pokefeed::alarm::{AlertKind, AlertProfile, Dispatcher, EventContext};
/// # use pokefeed::feed::{FeedTarget, GraphClient};
/// # async fn example(graph_client: GraphClient, profile: AlertProfile) {
/// let dispatcher = Dispatcher::new(graph_client, "page-access-token", FeedTarget::default());
/// let context = EventContext::new().with("pkmn", "Snorlax");
/// if let Err(e) = dispatcher.dispatch(&profile, &context).await {
///     eprintln!("alert not delivered: {}", e);
/// }
/// # }
/// ```
pub struct Dispatcher<C: FeedClient> {
    /// Feed provider client
    client: C,
    /// Credential used to open sessions
    credential: String,
    /// Destination and fixed fields of the posts
    target: FeedTarget,
    /// Current session, absent before the first post or after a transient failure
    connection: Mutex<Option<FeedConnection>>,
}

impl<C: FeedClient> Dispatcher<C> {
    /// Create a new [Dispatcher]. No session is opened until the first post.
    pub fn new(client: C, credential: &str, target: FeedTarget) -> Self {
        Dispatcher {
            client,
            credential: credential.to_owned(),
            target,
            connection: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &FeedTarget {
        &self.target
    }

    /// Resolves `profile` with `context` and publishes the resulting post.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::guarded_send`].
    pub async fn dispatch(
        &self,
        profile: &AlertProfile,
        context: &EventContext,
    ) -> Result<(), DispatchError> {
        let unresolved: Vec<&str> = [
            profile.message(),
            profile.link(),
            profile.title(),
            profile.name(),
        ]
        .into_iter()
        .flat_map(placeholders)
        .filter(|identifier| !context.contains(identifier))
        .collect();
        if !unresolved.is_empty() {
            debug!(
                "{} alert leaves placeholders unresolved: {:?}",
                profile.kind(),
                unresolved
            );
        }

        let payload = FeedPayload::alert(
            &self.target,
            resolve(profile.message(), context),
            resolve(profile.link(), context),
            resolve(profile.name(), context),
            resolve(profile.title(), context),
        );

        self.guarded_send(&payload).await?;
        info!("{} alert posted to {}", profile.kind(), self.target.page_id);

        Ok(())
    }

    /// Publishes a message-only post on the target feed.
    pub async fn post_text(&self, message: &str) -> Result<(), DispatchError> {
        let payload = FeedPayload::text(&self.target, message.to_owned());
        self.guarded_send(&payload).await
    }

    /// Publishes `payload`, reconnecting and retrying once on a transient failure.
    ///
    /// At most two publish attempts and two connections are made per call.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Connection`] if no session could be opened
    /// - [`DispatchError::Exhausted`] if the retry after reconnecting failed too
    /// - [`DispatchError::Rejected`] on a permanent failure, without retrying
    pub async fn guarded_send(&self, payload: &FeedPayload) -> Result<(), DispatchError> {
        let mut slot = self.connection.lock().await;

        let connection = match slot.take() {
            Some(connection) => connection,
            None => self.connect().await?,
        };

        match self.client.publish(&connection, payload).await {
            Ok(()) => {
                *slot = Some(connection);
                Ok(())
            }
            Err(e) if e.is_transient() => {
                warn!(
                    "publishing to {} failed: {}, reconnecting",
                    payload.target_id, e
                );
                drop(connection);

                let connection = self.connect().await?;
                match self.client.publish(&connection, payload).await {
                    Ok(()) => {
                        *slot = Some(connection);
                        Ok(())
                    }
                    Err(e) => {
                        // the new session stays valid after a permanent failure
                        if !e.is_transient() {
                            *slot = Some(connection);
                        }
                        Err(DispatchError::Exhausted(e.message().to_owned()))
                    }
                }
            }
            Err(e) => {
                *slot = Some(connection);
                Err(DispatchError::Rejected(e.message().to_owned()))
            }
        }
    }

    async fn connect(&self) -> Result<FeedConnection, DispatchError> {
        let connection = self
            .client
            .connect(&self.credential)
            .await
            .map_err(|e| DispatchError::Connection(e.message().to_owned()))?;
        info!(
            "connected to the feed of {} as {}",
            self.target.page_id,
            connection.account()
        );

        Ok(connection)
    }

    #[cfg(test)]
    async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }
}
