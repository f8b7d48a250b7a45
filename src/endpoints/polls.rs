//! Poll CRUD endpoints. These all go through [`AuthorizedClient`] so the
//! bearer token is attached (when present) and 401s end the session.

use crate::{
    endpoints::EndpointError,
    polls::{CreatePollRequest, Page, Poll, PollImage, PollQuery},
    AuthorizedClient,
};
use serde_derive::{Deserialize, Serialize};

/// List polls, newest first by default.
pub async fn list_polls(
    http: &AuthorizedClient,
    query: &PollQuery,
) -> Result<Page<Poll>, EndpointError> {
    http.get("polls", &query.to_params()).await
}

/// Fetch a single poll with its options and current counts.
pub async fn get_poll(
    http: &AuthorizedClient,
    id: &str,
) -> Result<Poll, EndpointError> {
    let response: PollResponse = http.get(&format!("polls/{}", id), &[]).await?;

    Ok(response.poll)
}

/// List the polls created by the current user.
pub async fn my_polls(
    http: &AuthorizedClient,
    query: &PollQuery,
) -> Result<Page<Poll>, EndpointError> {
    http.get("polls/my/polls", &query.to_params()).await
}

/// Create a poll.
///
/// The request is multipart: a `pollData` part with the JSON body, and
/// one `images` file part per option that declared `has_image`, in
/// option order.
pub async fn create_poll(
    http: &AuthorizedClient,
    data: &CreatePollRequest,
    images: Vec<PollImage>,
) -> Result<PollWriteResponse, EndpointError> {
    let body = serde_json::to_string(data)
        .expect("CreatePollRequest always serializes");

    let mut form = reqwest::multipart::Form::new().text("pollData", body);
    for image in images {
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)?;
        form = form.part("images", part);
    }

    http.post_multipart("polls", form).await
}

/// Edit a poll the current user created.
pub async fn update_poll(
    http: &AuthorizedClient,
    id: &str,
    patch: &PollPatch,
) -> Result<PollWriteResponse, EndpointError> {
    http.put(&format!("polls/{}", id), patch).await
}

/// Delete a poll the current user created.
pub async fn delete_poll(
    http: &AuthorizedClient,
    id: &str,
) -> Result<(), EndpointError> {
    http.delete(&format!("polls/{}", id)).await
}

/// The fields of a poll its creator may change after the fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// What the server sends back after creating or editing a poll.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollWriteResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub poll: Option<Poll>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PollResponse {
    poll: Poll,
}
