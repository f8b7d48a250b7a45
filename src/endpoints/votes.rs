//! Voting endpoints. One vote per poll per day is enforced server-side;
//! the client just reports the rejection faithfully.

use crate::{
    endpoints::EndpointError,
    polls::{CanVote, Page, PollStats, PollVote, VoteRecord},
    AuthorizedClient,
};
use reqwest::StatusCode;
use serde_derive::Serialize;

/// Cast a vote for one option of a poll.
pub async fn vote(
    http: &AuthorizedClient,
    poll_id: &str,
    option_id: &str,
) -> Result<(), VoteError> {
    let data = Data { poll_id, option_id };

    match http.post_discard("votes", &data).await {
        Ok(()) => {
            log::info!("Voted for option {} on poll {}", option_id, poll_id);
            Ok(())
        },
        Err(EndpointError::Api { status, .. })
            if status == StatusCode::CONFLICT =>
        {
            Err(VoteError::AlreadyVotedToday)
        },
        Err(EndpointError::Api { status, message }) => {
            Err(VoteError::Rejected { status, message })
        },
        Err(EndpointError::HttpClient(err)) => Err(VoteError::HttpClient(err)),
    }
}

/// Ask whether the current user may still vote on this poll today.
pub async fn can_vote(
    http: &AuthorizedClient,
    poll_id: &str,
) -> Result<CanVote, EndpointError> {
    http.get(&format!("votes/can-vote/{}", poll_id), &[]).await
}

/// The current user's past votes, newest first.
pub async fn vote_history(
    http: &AuthorizedClient,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<Page<VoteRecord>, EndpointError> {
    http.get("votes/history", &page_params(page, limit)).await
}

/// Aggregated statistics for a poll. Only its creator gets these.
pub async fn poll_stats(
    http: &AuthorizedClient,
    poll_id: &str,
) -> Result<PollStats, EndpointError> {
    http.get(&format!("votes/stats/{}", poll_id), &[]).await
}

/// The raw votes cast on a poll, for its creator.
pub async fn poll_votes(
    http: &AuthorizedClient,
    poll_id: &str,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<Page<PollVote>, EndpointError> {
    http.get(
        &format!("votes/poll/{}", poll_id),
        &page_params(page, limit),
    )
    .await
}

fn page_params(page: Option<u32>, limit: Option<u32>) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();

    if let Some(page) = page {
        params.push(("page", page.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }

    params
}

#[derive(Debug, Copy, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Data<'a> {
    poll_id: &'a str,
    option_id: &'a str,
}

/// Possible errors that may be returned by [`vote()`].
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    /// The daily vote for this poll has already been spent.
    #[error("You have already voted on this poll today")]
    AlreadyVotedToday,
    /// The HTTP client encountered an error.
    #[error("Unable to send the vote request")]
    HttpClient(#[from] reqwest::Error),
    #[error("The vote was rejected by the server with {}: {}", status, message)]
    Rejected { status: StatusCode, message: String },
}
