//! # Signet Relay
//!
//! Embeddable relay between a host page and the Signet login frame.
//!
//! A host embeds the login UI in a frame and wires posted messages into
//! an [`SsoRelay`]. The relay validates each message's origin against the
//! login endpoint, decodes the `{topic, message}` envelope, tracks the
//! asserted signed-in user, and forwards sign-in assertions to the
//! embedder's callbacks. Transport is the embedder's problem; the relay
//! only ever sees `(origin, payload)` pairs.
//!
//! ## Example
//!
//! ```
//! use signet_relay::{SsoRelay, WatchOptions};
//!
//! let mut relay = SsoRelay::new("https://login.example.org/signin")?;
//! relay.watch(WatchOptions {
//!     logged_in_user: None,
//!     on_login: Some(Box::new(|event| {
//!         println!("signed in: {}", event.assertion);
//!         Ok(())
//!     })),
//!     on_logout: Some(Box::new(|| {
//!         println!("signed out");
//!         Ok(())
//!     })),
//! });
//!
//! relay.handle_message(
//!     "https://login.example.org",
//!     r#"{"topic":"onlogin","message":"ASSERTION"}"#,
//! );
//! assert!(relay.logged_in_user().is_some());
//! # Ok::<(), signet_relay::RelayError>(())
//! ```

/// Abstraction over the embedded login frame
pub mod frame;
/// Wire format of relay messages
pub mod message;
/// The relay itself: session state, handler registry and dispatch
pub mod relay;

pub use frame::LoginFrame;
pub use message::{Envelope, LoginEvent, RelayTopic};
pub use relay::{
    LoginHandler, LogoutHandler, ReadyHandler, RelayError, SsoRelay, WatchOptions,
};
