use crate::endpoints::EndpointError;
use reqwest::Client;
use serde_derive::Serialize;

/// Tell the server to invalidate the session behind this token.
///
/// Whatever the server answers with is ignored beyond the status code;
/// clearing local state is the caller's job either way.
pub async fn logout(
    client: &Client,
    base_url: &str,
    token: &str,
) -> Result<(), EndpointError> {
    let url = super::endpoint_url(base_url, "auth/logout");

    log::debug!("Sending a logout request to {}", url);
    let response = client
        .post(&url)
        .bearer_auth(token)
        .json(&Data {})
        .send()
        .await?;

    super::expect_success(response).await
}

#[derive(Debug, Copy, Clone, Serialize)]
struct Data {}
