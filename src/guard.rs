//! Navigation guards.
//!
//! The crate doesn't own a router; guards just decide. Callers apply the
//! decision to whatever navigation layer they have.

use crate::session::SessionManager;
use url::form_urlencoded;

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// The default landing view for authenticated users.
pub const POLLS_PATH: &str = "/polls";

/// A guard's verdict on a navigation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow,
    /// Navigation is denied; go here instead.
    Redirect(String),
}

/// Gate a view that requires a logged-in user.
///
/// Reads the state once (a later login doesn't retroactively allow the
/// navigation). On a fresh start there may be a perfectly good persisted
/// token that nobody has confirmed yet; restore it first rather than
/// bouncing the user to the login view for no reason.
pub async fn require_authenticated(
    session: &SessionManager,
    requested_path: &str,
) -> GuardDecision {
    if session.is_token_valid() && !session.is_authenticated() {
        session.load_session().await;
    }

    if session.is_authenticated() {
        GuardDecision::Allow
    } else {
        log::debug!(
            "Denying navigation to {}, redirecting to the login view",
            requested_path
        );
        GuardDecision::Redirect(login_redirect(requested_path))
    }
}

/// Gate a view that only makes sense logged out (login, register).
pub fn require_anonymous(session: &SessionManager) -> GuardDecision {
    if session.is_authenticated() {
        GuardDecision::Redirect(POLLS_PATH.to_string())
    } else {
        GuardDecision::Allow
    }
}

/// `/auth/login?returnUrl=<requested>`, so the login view can send the
/// user back where they were headed.
fn login_redirect(requested_path: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("returnUrl", requested_path)
        .finish();

    format!("{}?{}", LOGIN_PATH, query)
}
