//! OAuth token relay: `/login` sends the browser to GitHub, `/callback`
//! exchanges the returned code and forwards the token to the front end.

pub mod handler;
pub mod oauth;
pub mod state;

pub use handler::CallbackOutcome;
pub use oauth::OAuthClient;
