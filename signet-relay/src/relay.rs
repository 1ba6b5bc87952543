//! The relay itself: session state, handler registry and dispatch.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::{Origin, Url};

use crate::frame::LoginFrame;
use crate::message::{Envelope, LoginEvent, RelayTopic};

/// Errors surfaced while configuring the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The configured login endpoint is not an absolute URL.
    #[error("invalid login endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Handler invoked when a sign-in assertion arrives.
pub type LoginHandler = Box<dyn FnMut(LoginEvent) -> anyhow::Result<()> + Send>;
/// Handler invoked when the session ends.
pub type LogoutHandler = Box<dyn FnMut() -> anyhow::Result<()> + Send>;
/// Handler invoked when the login frame reports ready.
pub type ReadyHandler = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// Consumer configuration for [`SsoRelay::watch`].
#[derive(Default)]
pub struct WatchOptions {
    /// Previously known signed-in user, if the embedder persisted one.
    pub logged_in_user: Option<Value>,
    /// Called with each sign-in assertion.
    pub on_login: Option<LoginHandler>,
    /// Called when the session ends.
    pub on_logout: Option<LogoutHandler>,
}

impl fmt::Debug for WatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchOptions")
            .field("logged_in_user", &self.logged_in_user)
            .field("on_login", &self.on_login.is_some())
            .field("on_logout", &self.on_logout.is_some())
            .finish()
    }
}

/// Message relay between a host page and the Signet login frame.
///
/// The relay owns the transient session state: the currently asserted
/// user and the registered handlers. It validates message origins
/// against the login endpoint and guarantees that one bad message (or
/// one failing handler) never wedges the session.
pub struct SsoRelay {
    login_endpoint: Url,
    expected_origin: Origin,
    logged_in_user: Option<Value>,
    on_ready: Option<ReadyHandler>,
    on_login: Option<LoginHandler>,
    on_logout: Option<LogoutHandler>,
}

impl fmt::Debug for SsoRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoRelay")
            .field("login_endpoint", &self.login_endpoint.as_str())
            .field("logged_in_user", &self.logged_in_user)
            .finish_non_exhaustive()
    }
}

impl SsoRelay {
    /// Build a relay for the given login endpoint, for example
    /// `https://login.example.org/signin`.
    ///
    /// Messages are later accepted only from that endpoint's origin.
    pub fn new(login_endpoint: &str) -> Result<Self, RelayError> {
        let login_endpoint = Url::parse(login_endpoint)?;
        let expected_origin = login_endpoint.origin();
        Ok(Self {
            login_endpoint,
            expected_origin,
            logged_in_user: None,
            on_ready: None,
            on_login: None,
            on_logout: None,
        })
    }

    /// Register the embedder's session callbacks and any previously known
    /// signed-in user.
    pub fn watch(&mut self, options: WatchOptions) {
        self.logged_in_user = options.logged_in_user;
        self.on_login = options.on_login;
        self.on_logout = options.on_logout;
    }

    /// Send the frame to the login UI and register the ready handler.
    ///
    /// The embedder's own origin rides along as the query string so the
    /// login page knows where to post back.
    pub fn init(
        &mut self,
        frame: &mut dyn LoginFrame,
        embedder_origin: &str,
        on_ready: ReadyHandler,
    ) {
        let url = self.login_url(embedder_origin);
        self.on_ready = Some(on_ready);
        frame.navigate(&url);
    }

    /// The login-frame URL for a given embedder origin.
    pub fn login_url(&self, embedder_origin: &str) -> Url {
        let encoded = urlencoding::encode(embedder_origin);
        let mut url = self.login_endpoint.clone();
        url.set_query(Some(&encoded));
        url
    }

    /// Currently asserted user, if any.
    pub fn logged_in_user(&self) -> Option<&Value> {
        self.logged_in_user.as_ref()
    }

    /// Feed one posted message into the relay.
    ///
    /// Never fails outward: messages from foreign origins, unparseable
    /// frames, unknown topics and handler errors are logged and dropped.
    pub fn handle_message(&mut self, origin: &str, raw: &str) {
        if !self.origin_allowed(origin) {
            warn!("dropping relay message from foreign origin {origin}");
            return;
        }
        let envelope: Envelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("dropping unparseable relay message: {err}");
                return;
            }
        };
        let Some(topic) = RelayTopic::parse(&envelope.topic) else {
            debug!("ignoring relay message with unknown topic {:?}", envelope.topic);
            return;
        };
        self.dispatch(topic, envelope.message);
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        match Url::parse(origin) {
            Ok(url) => url.origin() == self.expected_origin,
            // Covers opaque "null" origins from sandboxed frames too.
            Err(_) => false,
        }
    }

    fn dispatch(&mut self, topic: RelayTopic, message: Value) {
        debug!("relay message: {topic}");
        match topic {
            RelayTopic::Ready => {
                if let Some(on_ready) = self.on_ready.as_mut() {
                    if let Err(err) = on_ready() {
                        warn!("ready handler failed: {err:#}");
                    }
                }
            }
            RelayTopic::Login => {
                let event = LoginEvent::from(message);
                self.logged_in_user = Some(
                    event
                        .logged_in_user
                        .clone()
                        .unwrap_or_else(|| event.assertion.clone()),
                );
                if let Some(on_login) = self.on_login.as_mut() {
                    if let Err(err) = on_login(event) {
                        warn!("login handler failed: {err:#}");
                    }
                }
            }
            RelayTopic::Logout => {
                self.logged_in_user = None;
                if let Some(on_logout) = self.on_logout.as_mut() {
                    if let Err(err) = on_logout() {
                        warn!("logout handler failed: {err:#}");
                    }
                }
            }
        }
    }
}
