//! Data exchanged with a feed client.

use std::fmt;

/// Default page whose feed receives the posts.
pub const DEFAULT_PAGE_ID: &str = "157783561377843";
/// Default caption of the link preview.
pub const DEFAULT_CAPTION: &str = "Valor Boolopole";
/// Default description of the link preview.
pub const DEFAULT_DESCRIPTION: &str = "Click to open google maps and precise location";

/// Destination of an alarm's posts and the fixed fields attached to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedTarget {
    /// Identifier of the parent object whose feed receives the posts
    pub page_id: String,
    /// Caption of the link preview
    pub caption: String,
    /// Description of the link preview
    pub description: String,
}

impl Default for FeedTarget {
    fn default() -> Self {
        FeedTarget {
            page_id: DEFAULT_PAGE_ID.to_owned(),
            caption: DEFAULT_CAPTION.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
        }
    }
}

/// Authenticated session with the feed provider.
///
/// Holds the access token validated by [`FeedClient::connect`](crate::feed::FeedClient::connect).
#[derive(Clone, PartialEq, Eq)]
pub struct FeedConnection {
    access_token: String,
    /// Display name of the account the token belongs to
    account: String,
}

impl FeedConnection {
    /// Creates a session for `access_token`, owned by `account`.
    pub fn new(access_token: &str, account: &str) -> Self {
        FeedConnection {
            access_token: access_token.to_owned(),
            account: account.to_owned(),
        }
    }

    /// Token sent with every request of the session.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Display name of the account, or its identifier when it has no name.
    pub fn account(&self) -> &str {
        &self.account
    }
}

// The token must never end up in logs.
impl fmt::Debug for FeedConnection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FeedConnection")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// A post ready to be published.
///
/// Alert posts carry every field. Text posts, such as the startup announcement,
/// only carry a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedPayload {
    /// Identifier of the parent object whose feed receives the post
    pub target_id: String,
    /// Body of the post
    pub message: String,
    /// Link attached to the post
    pub link: Option<String>,
    /// Name of the link preview
    pub name: Option<String>,
    /// Picture url, resolved from the profile title
    pub picture: Option<String>,
    /// Caption of the link preview
    pub caption: Option<String>,
    /// Description of the link preview
    pub description: Option<String>,
}

impl FeedPayload {
    /// Creates an alert post for `target` with the resolved templates.
    pub fn alert(
        target: &FeedTarget,
        message: String,
        link: String,
        name: String,
        picture: String,
    ) -> Self {
        FeedPayload {
            target_id: target.page_id.clone(),
            message,
            link: Some(link),
            name: Some(name),
            picture: Some(picture),
            caption: Some(target.caption.clone()),
            description: Some(target.description.clone()),
        }
    }

    /// Creates a message-only post for `target`.
    pub fn text(target: &FeedTarget, message: String) -> Self {
        FeedPayload {
            target_id: target.page_id.clone(),
            message,
            link: None,
            name: None,
            picture: None,
            caption: None,
            description: None,
        }
    }

    /// Returns the present fields as form parameters, target excluded.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("link", &self.link),
            ("name", &self.name),
            ("picture", &self.picture),
            ("caption", &self.caption),
            ("description", &self.description),
        ];

        std::iter::once(("message", self.message.as_str()))
            .chain(
                optional
                    .into_iter()
                    .filter_map(|(key, value)| value.as_deref().map(|value| (key, value))),
            )
            .collect()
    }
}

impl fmt::Display for FeedPayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "target={}, message={}, link={:?}, name={:?}, picture={:?}",
            self.target_id, self.message, self.link, self.name, self.picture
        )
    }
}
