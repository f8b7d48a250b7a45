//! The voting API's endpoints.
//!
//! Each endpoint is a free function over a [`reqwest::Client`] and the
//! API's base URL. Authenticated endpoints take the bearer token
//! explicitly; attaching it automatically is the job of
//! [`crate::AuthorizedClient`].

mod login;
mod logout;
mod polls;
mod profile;
mod refresh;
mod register;
mod votes;

pub use login::{login, AuthResponse, LoginError};
pub use logout::logout;
pub use polls::{
    create_poll, delete_poll, get_poll, list_polls, my_polls, update_poll,
    PollPatch, PollWriteResponse,
};
pub use profile::{get_profile, update_profile, ProfileUpdate};
pub use refresh::refresh;
pub use register::{register, RegisterError};
pub use votes::{can_vote, poll_stats, poll_votes, vote, vote_history, VoteError};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_derive::Deserialize;
use std::fmt::Debug;

/// Typical endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    HttpClient(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("The server rejected the request with {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl EndpointError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            EndpointError::Api { status, .. } => Some(*status),
            EndpointError::HttpClient(err) => err.status(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn with_bearer(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

pub(crate) async fn get<R>(
    client: &Client,
    base_url: &str,
    path: &str,
    token: Option<&str>,
    query: &[(&str, String)],
) -> Result<R, EndpointError>
where
    R: DeserializeOwned,
{
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a GET request to {}", url);
    let response = with_bearer(client.get(&url), token)
        .query(query)
        .send()
        .await?;

    read_json(response).await
}

pub(crate) async fn post<D, R>(
    client: &Client,
    base_url: &str,
    path: &str,
    token: Option<&str>,
    data: &D,
) -> Result<R, EndpointError>
where
    D: Debug + Serialize,
    R: DeserializeOwned,
{
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a POST request to {}", url);
    log::trace!("Payload: {:#?}", data);
    let response = with_bearer(client.post(&url), token)
        .json(data)
        .send()
        .await?;

    read_json(response).await
}

pub(crate) async fn put<D, R>(
    client: &Client,
    base_url: &str,
    path: &str,
    token: Option<&str>,
    data: &D,
) -> Result<R, EndpointError>
where
    D: Debug + Serialize,
    R: DeserializeOwned,
{
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a PUT request to {}", url);
    log::trace!("Payload: {:#?}", data);
    let response = with_bearer(client.put(&url), token)
        .json(data)
        .send()
        .await?;

    read_json(response).await
}

pub(crate) async fn delete(
    client: &Client,
    base_url: &str,
    path: &str,
    token: Option<&str>,
) -> Result<(), EndpointError> {
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a DELETE request to {}", url);
    let response = with_bearer(client.delete(&url), token).send().await?;

    expect_success(response).await
}

pub(crate) async fn post_multipart<R>(
    client: &Client,
    base_url: &str,
    path: &str,
    token: Option<&str>,
    form: reqwest::multipart::Form,
) -> Result<R, EndpointError>
where
    R: DeserializeOwned,
{
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a multipart POST request to {}", url);
    let response = with_bearer(client.post(&url), token)
        .multipart(form)
        .send()
        .await?;

    read_json(response).await
}

/// A POST whose response body we don't care about beyond success.
pub(crate) async fn post_discard<D>(
    client: &Client,
    base_url: &str,
    path: &str,
    token: Option<&str>,
    data: &D,
) -> Result<(), EndpointError>
where
    D: Debug + Serialize,
{
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a POST request to {}", url);
    log::trace!("Payload: {:#?}", data);
    let response = with_bearer(client.post(&url), token)
        .json(data)
        .send()
        .await?;

    expect_success(response).await
}

async fn read_json<R>(response: Response) -> Result<R, EndpointError>
where
    R: DeserializeOwned,
{
    let status = response.status();
    log::trace!("Response status: {}", status);

    if status.is_success() {
        Ok(response.json().await?)
    } else {
        Err(api_error(status, response).await)
    }
}

async fn expect_success(response: Response) -> Result<(), EndpointError> {
    let status = response.status();
    log::trace!("Response status: {}", status);

    if status.is_success() {
        Ok(())
    } else {
        Err(api_error(status, response).await)
    }
}

/// Pull the server's `{"message": ...}` body out of an error response,
/// falling back to the status' canonical reason.
async fn api_error(status: StatusCode, response: Response) -> EndpointError {
    let message = match response.json::<ApiMessage>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    EndpointError::Api { status, message }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ApiMessage {
    message: String,
}
