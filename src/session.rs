//! The session lifecycle: login, restore, refresh, logout.

use crate::{
    endpoints::{
        self, AuthResponse, EndpointError, LoginError, ProfileUpdate,
        RegisterError,
    },
    store::TokenStore,
    token,
};
use reqwest::Client;
use serde_derive::Deserialize;
use std::sync::{Arc, Mutex, Weak};
use tokio::{sync::watch, task::JoinHandle};

/// A user of the voting app.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// A live session: the bearer token plus the confirmed user behind it.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    /// The token's `exp` claim, when it can be decoded.
    pub fn expires_at(&self) -> Option<i64> {
        token::decode_claims(&self.token)
            .ok()
            .map(|claims| claims.exp)
    }
}

/// The authentication state broadcast to subscribers.
///
/// `authenticated` is only true once the server has confirmed the user
/// behind the token, so UI layers never flash a logged-in view for a
/// token the server would reject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub authenticated: bool,
    pub user: Option<User>,
}

/// Owns the bearer token: performs login/logout, restores a persisted
/// session on startup, and keeps the token fresh in the background.
///
/// Construct one per application with [`SessionManager::new`] and share
/// the [`Arc`]; there is no global instance.
pub struct SessionManager {
    client: Client,
    base_url: String,
    store: Box<dyn TokenStore>,
    inner: Mutex<Inner>,
    auth_tx: watch::Sender<AuthState>,
    weak: Weak<SessionManager>,
}

#[derive(Default)]
struct Inner {
    user: Option<User>,
    authenticated: bool,
    /// Bumped on every transition in or out of a session. Lets in-flight
    /// work detect that the session it started under is gone.
    generation: u64,
    refresh_task: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new<S: Into<String>>(
        client: Client,
        base_url: S,
        store: Box<dyn TokenStore>,
    ) -> Arc<SessionManager> {
        let (auth_tx, _) = watch::channel(AuthState::default());

        Arc::new_cyclic(|weak| SessionManager {
            client,
            base_url: base_url.into(),
            store,
            inner: Mutex::new(Inner::default()),
            auth_tx,
            weak: weak.clone(),
        })
    }

    /// Authenticate and start a session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, LoginError> {
        let response =
            endpoints::login(&self.client, &self.base_url, email, password).await?;

        Ok(self.start_session(response))
    }

    /// Create an account and start a session.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, RegisterError> {
        let response =
            endpoints::register(&self.client, &self.base_url, name, email, password)
                .await?;

        Ok(self.start_session(response))
    }

    /// End the session.
    ///
    /// The server is told to invalidate the token, but local state is
    /// cleared whether or not that call succeeds. Where the application
    /// navigates afterwards is up to the caller.
    pub async fn logout(&self) {
        if let Some(token) = self.token() {
            if let Err(err) =
                endpoints::logout(&self.client, &self.base_url, &token).await
            {
                log::warn!("Server-side logout failed: {}", err);
            }
        }

        self.clear_session();
    }

    /// Restore a session from the persisted token, if there is one.
    ///
    /// The session only becomes authenticated once the profile fetch
    /// confirms the token. A 401 clears the token; any other failure
    /// (network trouble, a 5xx) leaves it in place so ordinary request
    /// flow can retry later.
    pub async fn load_session(&self) {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                log::debug!("No persisted token found");
                return;
            },
            Err(err) => {
                log::warn!("Unable to read the persisted token: {}", err);
                return;
            },
        };

        if token::is_expired(&token) {
            log::warn!("The persisted token is expired, clearing it");
            self.clear_session();
            return;
        }

        let generation = self.generation();

        match endpoints::get_profile(&self.client, &self.base_url, &token).await {
            Ok(user) => {
                {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.generation != generation {
                        // a logout raced the profile fetch; its result
                        // must not resurrect the session
                        log::debug!("Session changed while restoring, discarding");
                        return;
                    }
                    inner.user = Some(user.clone());
                    inner.authenticated = true;
                    inner.generation += 1;
                    self.auth_tx.send_replace(AuthState {
                        authenticated: true,
                        user: Some(user),
                    });
                }
                self.schedule_refresh(&token);
            },
            Err(err) if err.is_unauthorized() => {
                log::warn!("The persisted token was rejected, clearing it");
                self.clear_session();
            },
            Err(err) => {
                log::warn!(
                    "Unable to confirm the persisted token ({}), keeping it",
                    err
                );
            },
        }
    }

    /// Change the current user's name and/or password. A user included
    /// in the response replaces the current one wholesale.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<(), UpdateProfileError> {
        let token = self.token().ok_or(UpdateProfileError::NotLoggedIn)?;

        let user =
            endpoints::update_profile(&self.client, &self.base_url, &token, update)
                .await?;

        if let Some(user) = user {
            let mut inner = self.inner.lock().unwrap();
            inner.user = Some(user.clone());
            self.auth_tx.send_replace(AuthState {
                authenticated: inner.authenticated,
                user: Some(user),
            });
        }

        Ok(())
    }

    /// The persisted bearer token, if any.
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(err) => {
                log::warn!("Unable to read the persisted token: {}", err);
                None
            },
        }
    }

    /// Is there a server-confirmed session right now?
    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().unwrap().authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.lock().unwrap().user.clone()
    }

    /// Is there a persisted token that hasn't passed its expiry yet?
    ///
    /// Cheaper than [`SessionManager::load_session`]: no round-trip, so
    /// no guarantee the server still accepts it.
    pub fn is_token_valid(&self) -> bool {
        match self.token() {
            Some(token) => !token::is_expired(&token),
            None => false,
        }
    }

    /// A snapshot of the confirmed session, if there is one.
    pub fn session(&self) -> Option<Session> {
        let user = {
            let inner = self.inner.lock().unwrap();
            if !inner.authenticated {
                return None;
            }
            inner.user.clone()?
        };
        let token = self.token()?;

        Some(Session { token, user })
    }

    /// Watch the authentication state. New subscribers see the current
    /// value immediately.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    fn start_session(&self, response: AuthResponse) -> Session {
        let AuthResponse { token, user, .. } = response;

        if let Err(err) = self.store.save(&token) {
            log::warn!("Unable to persist the token: {}", err);
        }

        {
            let mut inner = self.inner.lock().unwrap();
            inner.user = Some(user.clone());
            inner.authenticated = true;
            inner.generation += 1;
            self.auth_tx.send_replace(AuthState {
                authenticated: true,
                user: Some(user.clone()),
            });
        }

        self.schedule_refresh(&token);

        Session { token, user }
    }

    fn clear_session(&self) {
        if let Err(err) = self.store.clear() {
            log::warn!("Unable to clear the persisted token: {}", err);
        }

        let task = {
            let mut inner = self.inner.lock().unwrap();
            inner.user = None;
            inner.authenticated = false;
            inner.generation += 1;
            self.auth_tx.send_replace(AuthState::default());
            inner.refresh_task.take()
        };

        if let Some(task) = task {
            task.abort();
        }
    }

    /// Arrange for the token to be refreshed shortly before it expires.
    /// Each call replaces any previously scheduled refresh.
    fn schedule_refresh(&self, token: &str) {
        let delay = match token::refresh_delay(token) {
            Some(delay) => delay,
            None => {
                log::error!("Unable to decode the token, not scheduling a refresh");
                return;
            },
        };

        log::debug!("Refreshing the token in {:?}", delay);

        let manager = self.weak.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(manager) = manager.upgrade() {
                manager.refresh().await;
            }
        });

        let old = self.inner.lock().unwrap().refresh_task.replace(handle);
        if let Some(old) = old {
            old.abort();
        }
    }

    /// Trade the current token for a fresh one. Failure ends the
    /// session, since a rejected refresh almost always means the server
    /// invalidated it.
    pub(crate) async fn refresh(&self) {
        let token = match self.token() {
            Some(token) => token,
            None => return,
        };

        match endpoints::refresh(&self.client, &self.base_url, &token).await {
            Ok(new_token) => {
                if let Err(err) = self.store.save(&new_token) {
                    log::warn!("Unable to persist the refreshed token: {}", err);
                }
                self.schedule_refresh(&new_token);
            },
            Err(err) => {
                log::warn!("Token refresh failed ({}), ending the session", err);
                self.clear_session();
            },
        }
    }

    /// React to a 401 seen by [`crate::AuthorizedClient`].
    ///
    /// `seen` is the generation the failing request started under; only
    /// the first 401 of a generation triggers the logout, however many
    /// requests were in flight.
    pub(crate) async fn handle_unauthorized(&self, seen: u64) {
        if self.token().is_none() && !self.is_authenticated() {
            return;
        }

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.generation != seen {
                return;
            }
            inner.generation += 1;
        }

        log::warn!("The server no longer accepts the token, logging out");
        self.logout().await;
    }

    pub(crate) fn client(&self) -> &Client { &self.client }

    pub(crate) fn base_url(&self) -> &str { &self.base_url }

    pub(crate) fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().unwrap().refresh_task.take() {
            task.abort();
        }
    }
}

/// Possible errors that may be returned by
/// [`SessionManager::update_profile`].
#[derive(Debug, thiserror::Error)]
pub enum UpdateProfileError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Unable to update the profile")]
    Endpoint(#[from] EndpointError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::MemoryTokenStore,
        token::{tests::token_with_exp, unix_now},
    };
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    /// A base URL nothing is listening on, for exercising network
    /// failures.
    const DEAD_END: &str = "http://127.0.0.1:9";

    fn user_json() -> serde_json::Value {
        json!({
            "id": "user-1",
            "name": "Ada",
            "email": "ada@example.com",
            "createdAt": "2026-01-01T00:00:00Z"
        })
    }

    fn manager(base_url: &str, store: MemoryTokenStore) -> Arc<SessionManager> {
        SessionManager::new(Client::new(), base_url, Box::new(store))
    }

    async fn mount_login(server: &MockServer, token: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Login successful",
                "token": token,
                "user": user_json()
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn login_starts_an_authenticated_session() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        mount_login(&server, &token).await;
        let manager = manager(&server.uri(), MemoryTokenStore::new());

        let session = manager.login("ada@example.com", "pw").await.unwrap();

        assert_eq!(session.token, token);
        assert_eq!(session.user.name, "Ada");
        assert!(manager.is_authenticated());
        assert_eq!(manager.token(), Some(token));
    }

    #[tokio::test]
    async fn failed_login_changes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"message": "Invalid credentials"}),
            ))
            .mount(&server)
            .await;
        let manager = manager(&server.uri(), MemoryTokenStore::new());

        let err = manager.login("ada@example.com", "wrong").await.unwrap_err();

        assert!(matches!(err, LoginError::InvalidCredentials));
        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), None);
    }

    #[tokio::test]
    async fn logout_clears_state_even_when_the_server_errors() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        mount_login(&server, &token).await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let manager = manager(&server.uri(), MemoryTokenStore::new());
        manager.login("ada@example.com", "pw").await.unwrap();

        manager.logout().await;

        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), None);
        assert_eq!(manager.current_user(), None);
    }

    #[tokio::test]
    async fn restoring_confirms_the_profile_before_authenticating() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .and(header("Authorization", format!("Bearer {}", token).as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": user_json()})),
            )
            .mount(&server)
            .await;
        let manager =
            manager(&server.uri(), MemoryTokenStore::containing(&token));

        assert!(!manager.is_authenticated());
        manager.load_session().await;

        assert!(manager.is_authenticated());
        assert_eq!(manager.current_user().unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn restoring_with_a_rejected_token_clears_it() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"message": "Unauthorized"}),
            ))
            .mount(&server)
            .await;
        let manager =
            manager(&server.uri(), MemoryTokenStore::containing(&token));

        manager.load_session().await;

        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), None);
    }

    #[tokio::test]
    async fn restoring_over_a_flaky_network_keeps_the_token() {
        let token = token_with_exp(unix_now() + 7200);
        let manager = manager(DEAD_END, MemoryTokenStore::containing(&token));

        manager.load_session().await;

        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), Some(token));
    }

    #[tokio::test]
    async fn restoring_an_expired_token_clears_it_without_a_round_trip() {
        let token = token_with_exp(unix_now() - 100);
        let manager = manager(DEAD_END, MemoryTokenStore::containing(&token));

        manager.load_session().await;

        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), None);
    }

    #[tokio::test]
    async fn a_logout_during_restore_wins() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": user_json()}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        let manager =
            manager(&server.uri(), MemoryTokenStore::containing(&token));

        let restoring = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.load_session().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.logout().await;
        restoring.await.unwrap();

        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), None);
    }

    #[tokio::test]
    async fn refresh_swaps_the_stored_token() {
        let server = MockServer::start().await;
        let old = token_with_exp(unix_now() + 7200);
        let new = token_with_exp(unix_now() + 14400);
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("Authorization", format!("Bearer {}", old).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"message": "ok", "token": new.as_str()}),
            ))
            .mount(&server)
            .await;
        let manager = manager(&server.uri(), MemoryTokenStore::containing(&old));

        manager.refresh().await;

        assert_eq!(manager.token(), Some(new));
    }

    #[tokio::test]
    async fn failed_refresh_ends_the_session() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let manager =
            manager(&server.uri(), MemoryTokenStore::containing(&token));

        manager.refresh().await;

        assert!(!manager.is_authenticated());
        assert_eq!(manager.token(), None);
    }

    #[tokio::test]
    async fn subscribers_see_the_current_state_immediately() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        mount_login(&server, &token).await;
        let manager = manager(&server.uri(), MemoryTokenStore::new());
        manager.login("ada@example.com", "pw").await.unwrap();

        // subscribed after the fact, still sees the login
        let state = manager.subscribe().borrow().clone();

        assert!(state.authenticated);
        assert_eq!(state.user.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn update_profile_replaces_the_broadcast_user() {
        let server = MockServer::start().await;
        let token = token_with_exp(unix_now() + 7200);
        mount_login(&server, &token).await;
        Mock::given(method("PUT"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {
                    "id": "user-1",
                    "name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "createdAt": "2026-01-01T00:00:00Z"
                }
            })))
            .mount(&server)
            .await;
        let manager = manager(&server.uri(), MemoryTokenStore::new());
        manager.login("ada@example.com", "pw").await.unwrap();

        let update = ProfileUpdate {
            name: Some(String::from("Ada Lovelace")),
            ..ProfileUpdate::default()
        };
        manager.update_profile(&update).await.unwrap();

        assert_eq!(manager.current_user().unwrap().name, "Ada Lovelace");
        assert_eq!(
            manager.subscribe().borrow().user.as_ref().unwrap().name,
            "Ada Lovelace"
        );
    }

    #[test]
    fn session_exposes_its_expiry() {
        let session = Session {
            token: token_with_exp(4_102_444_800),
            user: serde_json::from_value(user_json()).unwrap(),
        };

        assert_eq!(session.expires_at(), Some(4_102_444_800));
    }
}
