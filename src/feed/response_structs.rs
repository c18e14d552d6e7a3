//! Response structures of the Graph API.
//!
//! This module contains structures for deserializing the JSON bodies returned by
//! the Graph API endpoints used by [`GraphClient`](crate::feed::GraphClient).

use serde::Deserialize;
use std::fmt;

/// Response of `/me`: the account the access token belongs to.
#[derive(Deserialize, Debug)]
pub struct MeResponse {
    /// Identifier of the account.
    pub id: String,
    /// Display name of the account, when the token grants it.
    pub name: Option<String>,
}

impl fmt::Display for MeResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "id={}, name={:?}", self.id, self.name)
    }
}

/// Response of `/{page_id}/feed`: the identifier of the new post.
#[derive(Deserialize, Debug)]
pub struct PostResponse {
    pub id: String,
}

/// Error body returned by the Graph API on failure.
///
/// ```json
/// { "error": { "message": "Error validating access token", "type": "OAuthException", "code": 190 } }
/// ```
#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: GraphError,
}

/// Details of a Graph API error.
#[derive(Deserialize, Debug)]
pub struct GraphError {
    /// Human readable diagnostic.
    pub message: String,
    /// Error family, e.g. `OAuthException`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Numeric error code.
    pub code: Option<i64>,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (type={}, code={})",
            self.message,
            self.kind.as_deref().unwrap_or("unknown"),
            self.code.map_or("unknown".to_owned(), |code| code.to_string())
        )
    }
}
