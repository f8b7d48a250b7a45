use crate::endpoints::EndpointError;
use reqwest::Client;
use serde_derive::{Deserialize, Serialize};

/// Trade a still-valid bearer token for a fresh one.
pub async fn refresh(
    client: &Client,
    base_url: &str,
    token: &str,
) -> Result<String, EndpointError> {
    let response: RefreshResponse =
        super::post(client, base_url, "auth/refresh", Some(token), &Data {}).await?;

    log::debug!("Token refreshed");

    Ok(response.token)
}

#[derive(Debug, Copy, Clone, Serialize)]
struct Data {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RefreshResponse {
    token: String,
}
