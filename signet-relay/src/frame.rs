//! Abstraction over the embedded login frame.

use url::Url;

/// Where the relay sends the login UI.
///
/// A browser embedding backs this with an iframe; tests substitute a
/// recorder.
pub trait LoginFrame {
    /// Point the frame at `url`.
    fn navigate(&mut self, url: &Url);
}
