//! Wire format of relay messages.
//!
//! The login frame posts JSON envelopes shaped `{"topic": ..., "message":
//! ...}`. Topics form a closed set; the dispatcher drops anything else.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of topics the relay dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayTopic {
    /// The login frame finished loading and can be interacted with.
    Ready,
    /// A sign-in completed; the message carries the assertion.
    Login,
    /// The session ended.
    Logout,
}

impl RelayTopic {
    /// Parse a wire topic.
    ///
    /// Unknown strings are `None` rather than an error; the dispatcher
    /// ignores them the way an unhandled event is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "onready" => Some(RelayTopic::Ready),
            "onlogin" => Some(RelayTopic::Login),
            "onlogout" => Some(RelayTopic::Logout),
            _ => None,
        }
    }

    /// The topic as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayTopic::Ready => "onready",
            RelayTopic::Login => "onlogin",
            RelayTopic::Logout => "onlogout",
        }
    }
}

impl fmt::Display for RelayTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One posted message, as decoded off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Raw topic string; see [`RelayTopic::parse`].
    pub topic: String,
    /// Topic-specific payload; absent payloads decode as `null`.
    #[serde(default)]
    pub message: Value,
}

/// A sign-in payload, pulled apart leniently.
///
/// The login page posts `{assertion, loggedInUser}`, but some embedders
/// post the bare assertion as the whole message. Both shapes are
/// accepted; a bare payload becomes the assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginEvent {
    /// Opaque authentication assertion, forwarded verbatim.
    pub assertion: Value,
    /// Asserted signed-in user, when the payload named one.
    pub logged_in_user: Option<Value>,
}

impl From<Value> for LoginEvent {
    fn from(message: Value) -> Self {
        if let Value::Object(map) = &message {
            if let Some(assertion) = map.get("assertion") {
                return LoginEvent {
                    assertion: assertion.clone(),
                    logged_in_user: map.get("loggedInUser").cloned(),
                };
            }
        }
        LoginEvent {
            assertion: message,
            logged_in_user: None,
        }
    }
}
