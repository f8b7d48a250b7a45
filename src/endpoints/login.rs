use crate::{endpoints::EndpointError, session::User};
use reqwest::{Client, StatusCode};
use serde_derive::{Deserialize, Serialize};

/// Authenticate with the voting API.
///
/// On success the server hands back a fresh bearer token and the user it
/// belongs to; keeping those around is [`crate::SessionManager`]'s job.
pub async fn login(
    client: &Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<AuthResponse, LoginError> {
    let data = Data { email, password };

    match super::post::<_, AuthResponse>(client, base_url, "auth/login", None, &data)
        .await
    {
        Ok(response) => {
            log::info!("Logged in as {}", response.user.email);
            Ok(response)
        },
        Err(EndpointError::Api { status, .. })
            if status == StatusCode::UNAUTHORIZED =>
        {
            log::warn!("Login rejected for {}", email);
            Err(LoginError::InvalidCredentials)
        },
        Err(EndpointError::Api { status, message }) => {
            Err(LoginError::RejectedByServer { status, message })
        },
        Err(EndpointError::HttpClient(err)) => Err(LoginError::HttpClient(err)),
    }
}

/// The body of a successful login or register call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Copy, Clone, Serialize)]
struct Data<'a> {
    email: &'a str,
    password: &'a str,
}

/// Possible errors that may be returned by [`login()`].
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The server didn't accept the email/password pair.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// The HTTP client encountered an error.
    #[error("Unable to send the login request")]
    HttpClient(#[from] reqwest::Error),
    /// A catch-all for any other rejection.
    #[error("Login was rejected by the server with {}: {}", status, message)]
    RejectedByServer { status: StatusCode, message: String },
}
