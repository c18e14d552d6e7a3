//! Feed provider integration.
//!
//! This module defines the [`FeedClient`] capability the alarms publish through and
//! its Graph API implementation.
//!
//! # Modules
//!
//! - `graph_client` - HTTP client for the Graph API page feed
//! - `response_structs` - Internal data structures for Graph API responses
//! - `structs` - Connection, target and payload types shared with the alarms
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use pokefeed::feed::{FeedClient, FeedPayload, FeedTarget, GraphClient};
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let client = GraphClient::new("https://graph.facebook.com", Duration::from_secs(30))?;
//! let connection = client.connect("page-access-token").await?;
//! let payload = FeedPayload::text(&FeedTarget::default(), "hello".to_string());
//! client.publish(&connection, &payload).await?;
//! # Ok(())
//! # }
//! ```

mod graph_client;
mod response_structs;
mod structs;

use mockall::automock;
use thiserror::Error;

pub use crate::feed::graph_client::GraphClient;
pub use crate::feed::structs::{
    DEFAULT_CAPTION, DEFAULT_DESCRIPTION, DEFAULT_PAGE_ID, FeedConnection, FeedPayload, FeedTarget,
};

/// Failures reported by a [`FeedClient`].
///
/// The variant tells the dispatcher whether reconnecting can help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// No session could be established with the provider.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The credential was rejected or the connection dropped; a new session may succeed.
    #[error("transient failure: {0}")]
    Transient(String),
    /// The provider refused the post for good (malformed payload, permission, ...).
    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl FeedError {
    /// Whether a fresh connection may fix the failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Connection(_) | FeedError::Transient(_))
    }

    /// Diagnostic message of the provider.
    pub fn message(&self) -> &str {
        match self {
            FeedError::Connection(message)
            | FeedError::Transient(message)
            | FeedError::Permanent(message) => message,
        }
    }
}

/// Capability to publish posts to a social feed.
///
/// This trait abstracts the provider so the dispatch protocol can be tested with mocks.
#[automock]
pub trait FeedClient {
    /// Opens a session with `credential`.
    ///
    /// Fails with [`FeedError::Connection`].
    async fn connect(&self, credential: &str) -> Result<FeedConnection, FeedError>;
    /// Publishes `payload` on the feed of its target.
    ///
    /// Fails with [`FeedError::Transient`] or [`FeedError::Permanent`].
    async fn publish(
        &self,
        connection: &FeedConnection,
        payload: &FeedPayload,
    ) -> Result<(), FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FeedError::Connection("down".to_string()).is_transient());
        assert!(FeedError::Transient("expired".to_string()).is_transient());
        assert!(!FeedError::Permanent("bad".to_string()).is_transient());
    }

    #[test]
    fn test_message() {
        let error = FeedError::Permanent("(#100) Invalid parameter".to_string());

        assert_eq!(error.message(), "(#100) Invalid parameter");
        assert_eq!(
            error.to_string(),
            "permanent failure: (#100) Invalid parameter"
        );
    }
}
