use anyhow::Error;
use ballotbox::{
    endpoints, AuthorizedClient, FileTokenStore, MemoryTokenStore, PollQuery,
    SessionManager, TokenStore,
};
use reqwest::Client;
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!("Starting application with {:#?}", args);

    let client = Client::builder()
        .user_agent(ballotbox::DEFAULT_USER_AGENT)
        .build()?;

    let store: Box<dyn TokenStore> = match args.token_file {
        Some(ref path) => Box::new(FileTokenStore::new(path)),
        None => match FileTokenStore::in_config_dir() {
            Some(store) => Box::new(store),
            None => {
                log::warn!(
                    "No config directory on this platform, the session won't persist"
                );
                Box::new(MemoryTokenStore::new())
            },
        },
    };

    let session = SessionManager::new(client, args.api_url.clone(), store);
    let http = AuthorizedClient::new(Arc::clone(&session));

    match args.cmd {
        Command::Login { email, password } => {
            let session = session.login(&email, &password).await?;
            println!("Logged in as {} <{}>", session.user.name, session.user.email);
        },
        Command::Register {
            name,
            email,
            password,
        } => {
            let session = session.register(&name, &email, &password).await?;
            println!("Welcome, {}!", session.user.name);
        },
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        },
        Command::Whoami => {
            session.load_session().await;
            match session.current_user() {
                Some(user) => {
                    println!("{} <{}>, registered {}", user.name, user.email, user.created_at)
                },
                None => println!("Not logged in"),
            }
        },
        Command::Polls {
            page,
            limit,
            search,
            mine,
        } => {
            session.load_session().await;
            let query = PollQuery {
                page,
                limit,
                search,
                ..PollQuery::default()
            };

            let polls = if mine {
                endpoints::my_polls(&http, &query).await?
            } else {
                endpoints::list_polls(&http, &query).await?
            };

            for poll in &polls.items {
                let marker = if poll.is_active { "" } else { " (closed)" };
                println!(
                    "{}  {}{} - {} votes, by {}",
                    poll.id, poll.title, marker, poll.total_votes, poll.creator_name
                );
            }
            println!(
                "Page {} of {} ({} polls)",
                polls.pagination.page, polls.pagination.total_pages, polls.pagination.total
            );
        },
        Command::Show { id } => {
            session.load_session().await;
            let poll = endpoints::get_poll(&http, &id).await?;

            println!("{}", poll.title);
            if let Some(ref description) = poll.description {
                println!("{}", description);
            }
            for option in &poll.options {
                let percentage = option.percentage.unwrap_or(0.0);
                println!(
                    "  [{}] {} - {} votes ({:.1}%)",
                    option.id, option.text, option.vote_count, percentage
                );
            }
            if poll.has_voted_today == Some(true) {
                println!("You have already voted today.");
            }
        },
        Command::Vote { poll, option } => {
            session.load_session().await;
            endpoints::vote(&http, &poll, &option).await?;
            println!("Vote recorded");
        },
        Command::History { page, limit } => {
            session.load_session().await;
            let history = endpoints::vote_history(&http, page, limit).await?;

            for record in &history.items {
                println!(
                    "{}  {} → {}",
                    record.voted_at, record.poll.title, record.option.text
                );
            }
        },
        Command::Stats { id } => {
            session.load_session().await;
            let stats = endpoints::poll_stats(&http, &id).await?;

            println!("{}", stats.poll_title);
            println!(
                "{} votes from {} voters",
                stats.total_stats.total_votes, stats.total_stats.unique_voters
            );
            for option in &stats.option_stats {
                println!(
                    "  {} - {} votes ({:.1}%)",
                    option.text, option.vote_count, option.percentage
                );
            }
        },
    }

    Ok(())
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Talk to a Ballotbox voting server from the command line.")]
struct Args {
    #[structopt(
        long = "api-url",
        env = "BALLOTBOX_API_URL",
        help = "The API's base URL"
    )]
    api_url: String,
    #[structopt(long = "token-file", help = "Where to keep the session token")]
    token_file: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Log in and persist the session token.
    Login {
        #[structopt(short = "u", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
    },
    /// Create an account.
    Register {
        #[structopt(long = "name")]
        name: String,
        #[structopt(short = "u", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
    },
    /// End the session here and on the server.
    Logout,
    /// Show who is currently logged in.
    Whoami,
    /// List polls.
    Polls {
        #[structopt(long = "page")]
        page: Option<u32>,
        #[structopt(long = "limit")]
        limit: Option<u32>,
        #[structopt(long = "search")]
        search: Option<String>,
        /// Only polls created by the current user.
        #[structopt(long = "mine")]
        mine: bool,
    },
    /// Show a poll with its options and counts.
    Show { id: String },
    /// Vote for an option on a poll.
    Vote {
        poll: String,
        option: String,
    },
    /// Show the current user's vote history.
    History {
        #[structopt(long = "page")]
        page: Option<u32>,
        #[structopt(long = "limit")]
        limit: Option<u32>,
    },
    /// Show vote statistics for a poll you created.
    Stats { id: String },
}
