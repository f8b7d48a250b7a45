use crate::endpoints::{login::AuthResponse, EndpointError};
use reqwest::{Client, StatusCode};
use serde_derive::Serialize;

/// Create a new account. A successful registration also logs the user in.
pub async fn register(
    client: &Client,
    base_url: &str,
    name: &str,
    email: &str,
    password: &str,
) -> Result<AuthResponse, RegisterError> {
    let data = Data {
        name,
        email,
        password,
    };

    match super::post::<_, AuthResponse>(client, base_url, "auth/register", None, &data)
        .await
    {
        Ok(response) => {
            log::info!("Registered {}", response.user.email);
            Ok(response)
        },
        Err(EndpointError::Api { status, message })
            if status == StatusCode::BAD_REQUEST =>
        {
            Err(RegisterError::Validation(message))
        },
        Err(EndpointError::Api { status, .. })
            if status == StatusCode::CONFLICT =>
        {
            Err(RegisterError::EmailTaken)
        },
        Err(EndpointError::Api { status, message }) => {
            Err(RegisterError::RejectedByServer { status, message })
        },
        Err(EndpointError::HttpClient(err)) => Err(RegisterError::HttpClient(err)),
    }
}

#[derive(Debug, Copy, Clone, Serialize)]
struct Data<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Possible errors that may be returned by [`register()`].
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// The server rejected one of the submitted fields.
    #[error("{0}")]
    Validation(String),
    /// An account with this email address already exists.
    #[error("This email address is already registered")]
    EmailTaken,
    /// The HTTP client encountered an error.
    #[error("Unable to send the register request")]
    HttpClient(#[from] reqwest::Error),
    #[error("Registration was rejected by the server with {}: {}", status, message)]
    RejectedByServer { status: StatusCode, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn a_409_becomes_email_taken() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(409).set_body_json(
                serde_json::json!({"message": "Email already registered"}),
            ))
            .mount(&server)
            .await;
        let client = Client::new();

        let err = register(&client, &server.uri(), "Ada", "ada@example.com", "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, RegisterError::EmailTaken));
    }

    #[tokio::test]
    async fn a_400_carries_the_validation_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"message": "Password must be at least 8 characters"}),
            ))
            .mount(&server)
            .await;
        let client = Client::new();

        let err = register(&client, &server.uri(), "Ada", "ada@example.com", "pw")
            .await
            .unwrap_err();

        match err {
            RegisterError::Validation(message) => {
                assert_eq!(message, "Password must be at least 8 characters")
            },
            other => panic!("expected a validation error, got {:?}", other),
        }
    }
}
