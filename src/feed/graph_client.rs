//! HTTP client for the Graph API page feed.
//!
//! This module provides the [`GraphClient`] struct, the [`FeedClient`] implementation
//! used in production. It checks page access tokens and publishes posts on page feeds.

use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, StatusCode};

use crate::feed::{
    FeedClient, FeedConnection, FeedError, FeedPayload,
    response_structs::{ErrorResponse, MeResponse, PostResponse},
};

/// Graph API error codes meaning the access token must be renewed.
const SESSION_ERROR_CODES: [i64; 2] = [102, 190];

/// HTTP client publishing to the Graph API.
///
/// Cloning is cheap: clones share the underlying connection pool.
///
/// # Examples
///
/// ```no_run
/// # use std::time::Duration;
/// # use pokefeed::feed::GraphClient;
/// let graph_client = GraphClient::new("https://graph.facebook.com", Duration::from_secs(30)).unwrap();
/// ```
#[derive(Clone)]
pub struct GraphClient {
    /// Graph API base url, without trailing slash
    url: String,
    /// HTTP client
    client: Client,
}

impl GraphClient {
    /// Create a new [GraphClient].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the Graph API, optionally with a version segment.
    /// * `timeout` - Timeout applied to every request.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(GraphClient {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl FeedClient for GraphClient {
    /// Request `/me` to check the access token and get the account it belongs to.
    ///
    /// This api call returns a json object:
    /// ```
    /// { id: "157783561377843", name: "Valor Boolopole" }
    /// ```
    async fn connect(&self, credential: &str) -> Result<FeedConnection, FeedError> {
        let url = format!("{}/me", &self.url);
        info!("connect to graph api");
        debug!("request {}?fields=id,name", &url);

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", credential), ("fields", "id,name")])
            .send()
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Connection(error_message(status, &body)));
        }

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;

        debug!("response from {} -> {}", &url, &me);

        let account = me.name.unwrap_or(me.id);
        debug!("connected to graph api as {}", &account);

        Ok(FeedConnection::new(credential, &account))
    }

    /// Request `POST /{target_id}/feed` to publish the payload.
    ///
    /// The payload fields are sent as a form, along with the access token. The api
    /// returns the identifier of the new post:
    /// ```
    /// { id: "157783561377843_1234" }
    /// ```
    async fn publish(
        &self,
        connection: &FeedConnection,
        payload: &FeedPayload,
    ) -> Result<(), FeedError> {
        let url = format!("{}/{}/feed", &self.url, &payload.target_id);
        debug!("request {} with {}", &url, payload);

        let mut form = payload.form_fields();
        form.push(("access_token", connection.access_token()));

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| FeedError::Transient(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transient(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        match serde_json::from_str::<PostResponse>(&body) {
            Ok(post) => debug!("published post {}", post.id),
            Err(_) => debug!("published post, unexpected response {}", body),
        }

        Ok(())
    }
}

/// Sorts a failed publish into transient and permanent failures.
///
/// Expired or invalid sessions, unauthorized responses and server errors are
/// transient. Everything else is permanent.
fn classify_failure(status: StatusCode, body: &str) -> FeedError {
    let message = error_message(status, body);

    let session_error = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error.code)
        .is_some_and(|code| SESSION_ERROR_CODES.contains(&code));

    if session_error || status == StatusCode::UNAUTHORIZED || status.is_server_error() {
        FeedError::Transient(message)
    } else {
        FeedError::Permanent(message)
    }
}

/// Extracts the Graph API diagnostic from an error body, falling back to the status.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => format!("{}: {}", status, response.error),
        Err(_) => format!("{}: {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedTarget;

    fn graph_client(url: &str) -> GraphClient {
        GraphClient::new(url, Duration::from_secs(5)).unwrap()
    }

    fn alert_payload() -> FeedPayload {
        FeedPayload::alert(
            &FeedTarget::default(),
            "Snorlax at http://maps".to_string(),
            "http://maps".to_string(),
            "Snorlax".to_string(),
            "143.png".to_string(),
        )
    }

    #[tokio::test]
    async fn test_connect() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/me")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("access_token".to_owned(), "token".to_owned()),
                mockito::Matcher::UrlEncoded("fields".to_owned(), "id,name".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "157783561377843", "name": "Valor Boolopole"}"#)
            .create_async()
            .await;

        let connection = graph_client(&url).connect("token").await.unwrap();
        assert_eq!(connection.access_token(), "token");
        assert_eq!(connection.account(), "Valor Boolopole");
    }

    #[tokio::test]
    async fn test_connect_without_name_uses_id() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/me")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id": "157783561377843"}"#)
            .create_async()
            .await;

        let connection = graph_client(&url).connect("token").await.unwrap();
        assert_eq!(connection.account(), "157783561377843");
    }

    #[tokio::test]
    async fn test_connect_rejected_token() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/me")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(
                r#"{"error": {"message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190}}"#,
            )
            .create_async()
            .await;

        let error = graph_client(&url).connect("bad").await.unwrap_err();
        match error {
            FeedError::Connection(message) => {
                assert!(message.contains("Invalid OAuth access token."))
            }
            other => panic!("expected connection error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_unreachable_server() {
        let error = graph_client("http://127.0.0.1:1")
            .connect("token")
            .await
            .unwrap_err();

        assert!(matches!(error, FeedError::Connection(_)));
    }

    #[tokio::test]
    async fn test_publish() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/157783561377843/feed")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded(
                    "message".to_owned(),
                    "Snorlax at http://maps".to_owned(),
                ),
                mockito::Matcher::UrlEncoded("link".to_owned(), "http://maps".to_owned()),
                mockito::Matcher::UrlEncoded("name".to_owned(), "Snorlax".to_owned()),
                mockito::Matcher::UrlEncoded("picture".to_owned(), "143.png".to_owned()),
                mockito::Matcher::UrlEncoded("caption".to_owned(), "Valor Boolopole".to_owned()),
                mockito::Matcher::UrlEncoded("access_token".to_owned(), "token".to_owned()),
            ]))
            .with_status(200)
            .with_body(r#"{"id": "157783561377843_1"}"#)
            .expect(1)
            .create_async()
            .await;

        let connection = FeedConnection::new("token", "Valor Boolopole");
        graph_client(&url)
            .publish(&connection, &alert_payload())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_publish_expired_token_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("POST", "/157783561377843/feed")
            .with_status(400)
            .with_body(
                r#"{"error": {"message": "Error validating access token: Session has expired", "type": "OAuthException", "code": 190}}"#,
            )
            .create_async()
            .await;

        let connection = FeedConnection::new("token", "Valor Boolopole");
        let error = graph_client(&url)
            .publish(&connection, &alert_payload())
            .await
            .unwrap_err();

        assert!(matches!(error, FeedError::Transient(_)));
        assert!(error.message().contains("Session has expired"));
    }

    #[tokio::test]
    async fn test_publish_invalid_parameter_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("POST", "/157783561377843/feed")
            .with_status(400)
            .with_body(
                r#"{"error": {"message": "(#100) Invalid parameter", "type": "OAuthException", "code": 100}}"#,
            )
            .create_async()
            .await;

        let connection = FeedConnection::new("token", "Valor Boolopole");
        let error = graph_client(&url)
            .publish(&connection, &alert_payload())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            FeedError::Permanent(
                "400 Bad Request: (#100) Invalid parameter (type=OAuthException, code=100)"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_publish_server_error_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("POST", "/157783561377843/feed")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let connection = FeedConnection::new("token", "Valor Boolopole");
        let error = graph_client(&url)
            .publish(&connection, &alert_payload())
            .await
            .unwrap_err();

        assert!(matches!(error, FeedError::Transient(_)));
    }

    #[test]
    fn test_classify_failure() {
        assert!(classify_failure(StatusCode::UNAUTHORIZED, "").is_transient());
        assert!(
            classify_failure(
                StatusCode::BAD_REQUEST,
                r#"{"error": {"message": "Session key invalid", "code": 102}}"#
            )
            .is_transient()
        );
        assert!(!classify_failure(StatusCode::FORBIDDEN, "forbidden").is_transient());
        assert!(!classify_failure(StatusCode::BAD_REQUEST, "not json").is_transient());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let graph_client = graph_client("https://graph.facebook.com/v2.8/");
        assert_eq!(graph_client.url, "https://graph.facebook.com/v2.8");
    }
}
