//! An unofficial async client for the Ballotbox voting API.
//!
//! The interesting part is the session lifecycle: [`SessionManager`]
//! owns the bearer token (persisting it via a [`TokenStore`], refreshing
//! it before expiry, broadcasting auth-state changes), and
//! [`AuthorizedClient`] wraps the HTTP client so every request carries
//! the token and any `401` ends the session exactly once. The
//! [`endpoints`] module holds one function per API operation.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod endpoints;
mod guard;
mod http;
mod polls;
mod session;
mod store;
pub mod token;

pub use guard::{
    require_anonymous, require_authenticated, GuardDecision, LOGIN_PATH,
    POLLS_PATH,
};
pub use http::AuthorizedClient;
pub use polls::{
    CanVote, CreatePollOption, CreatePollRequest, DailyStat, OptionStat, Page,
    Pagination, Poll, PollImage, PollOption, PollQuery, PollStats, PollVote,
    SortOrder, TotalStats, VoteRecord, VotedOption, VotedPoll, Voter,
};
pub use session::{
    AuthState, Session, SessionManager, UpdateProfileError, User,
};
pub use store::{
    FileTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_FILE_NAME,
};

/// The default user agent to use when communicating with the server.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
