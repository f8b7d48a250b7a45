//! The authorization layer every application request goes through.

use crate::{endpoints, endpoints::EndpointError, session::SessionManager};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, sync::Arc};

/// A decorator around the HTTP client that attaches the bearer token to
/// every request (when one is present) and reacts to `401 Unauthorized`
/// responses by ending the session.
///
/// The 401 reaction is a side effect: the failing error is still
/// returned to the caller. At most one logout is triggered per session,
/// no matter how many in-flight requests see the same 401.
#[derive(Clone)]
pub struct AuthorizedClient {
    session: Arc<SessionManager>,
}

impl AuthorizedClient {
    pub fn new(session: Arc<SessionManager>) -> Self {
        AuthorizedClient { session }
    }

    pub fn session(&self) -> &Arc<SessionManager> { &self.session }

    pub(crate) async fn get<R>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R, EndpointError>
    where
        R: DeserializeOwned,
    {
        let (token, seen) = self.before_request();
        let result = endpoints::get(
            self.session.client(),
            self.session.base_url(),
            path,
            token.as_deref(),
            query,
        )
        .await;

        self.after_response(seen, result).await
    }

    pub(crate) async fn post<D, R>(
        &self,
        path: &str,
        data: &D,
    ) -> Result<R, EndpointError>
    where
        D: Debug + Serialize,
        R: DeserializeOwned,
    {
        let (token, seen) = self.before_request();
        let result = endpoints::post(
            self.session.client(),
            self.session.base_url(),
            path,
            token.as_deref(),
            data,
        )
        .await;

        self.after_response(seen, result).await
    }

    pub(crate) async fn post_discard<D>(
        &self,
        path: &str,
        data: &D,
    ) -> Result<(), EndpointError>
    where
        D: Debug + Serialize,
    {
        let (token, seen) = self.before_request();
        let result = endpoints::post_discard(
            self.session.client(),
            self.session.base_url(),
            path,
            token.as_deref(),
            data,
        )
        .await;

        self.after_response(seen, result).await
    }

    pub(crate) async fn post_multipart<R>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<R, EndpointError>
    where
        R: DeserializeOwned,
    {
        let (token, seen) = self.before_request();
        let result = endpoints::post_multipart(
            self.session.client(),
            self.session.base_url(),
            path,
            token.as_deref(),
            form,
        )
        .await;

        self.after_response(seen, result).await
    }

    pub(crate) async fn put<D, R>(
        &self,
        path: &str,
        data: &D,
    ) -> Result<R, EndpointError>
    where
        D: Debug + Serialize,
        R: DeserializeOwned,
    {
        let (token, seen) = self.before_request();
        let result = endpoints::put(
            self.session.client(),
            self.session.base_url(),
            path,
            token.as_deref(),
            data,
        )
        .await;

        self.after_response(seen, result).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), EndpointError> {
        let (token, seen) = self.before_request();
        let result = endpoints::delete(
            self.session.client(),
            self.session.base_url(),
            path,
            token.as_deref(),
        )
        .await;

        self.after_response(seen, result).await
    }

    fn before_request(&self) -> (Option<String>, u64) {
        (self.session.token(), self.session.generation())
    }

    async fn after_response<T>(
        &self,
        seen: u64,
        result: Result<T, EndpointError>,
    ) -> Result<T, EndpointError> {
        if let Err(ref err) = result {
            if err.is_unauthorized() {
                self.session.handle_unauthorized(seen).await;
            }
        }

        result
    }
}
