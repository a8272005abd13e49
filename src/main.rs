// Chirp - An object-oriented client for the Twitter REST and Streaming APIs
// Copyright (C) 2025 Chirp Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! chirp - command-line client
//!
//! Authorizes once with the PIN flow, stores the token per profile and then
//! talks to the REST and streaming APIs with it.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};

use chirp_core::logger::{Logger, LoggerConfig};
use chirp_core::{
    Api, ApplicationCredentials, CredentialStore, FilterParams, Message, Model, NewStatus,
    PublicTimeline, Settings, SharedCredentials, Status, Stream,
};

#[derive(Parser)]
#[command(version, about = "Twitter REST and Streaming API client")]
struct Cli {
    /// Stored token profile to use
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Log debug output to the console
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the PIN authorization and store the token
    Authorize,
    /// Show the authenticated user
    Whoami,
    /// Show the public timeline
    Timeline,
    /// Show one status
    Show { id: u64 },
    /// Post a status
    Post {
        text: String,
        #[arg(long)]
        reply_to: Option<u64>,
    },
    /// Retweet a status
    Retweet { id: u64 },
    /// Delete one of your statuses
    Delete { id: u64 },
    /// Follow the sample stream
    Sample {
        /// Stop after this many messages
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Follow the filter stream
    Filter {
        /// User ids to follow, comma separated
        #[arg(long, value_delimiter = ',')]
        follow: Vec<u64>,
        /// Keywords to track, comma separated
        #[arg(long, value_delimiter = ',')]
        track: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List stored profiles
    Profiles {
        /// Forget this profile instead
        #[arg(long)]
        remove: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Logger::init_with_config(LoggerConfig {
        level: if cli.verbose { Level::DEBUG } else { Level::INFO },
        console_output: cli.verbose,
        ..Default::default()
    })?;

    info!("chirp {} starting", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load()?;
    if let Some(profile) = cli.profile {
        settings.profile = profile;
    }

    let store = match &settings.database {
        Some(path) => CredentialStore::open_path(path).await?,
        None => CredentialStore::open().await?,
    };

    match cli.command {
        Command::Authorize => authorize(&settings, &store).await,
        Command::Profiles { remove } => profiles(&store, remove).await,
        command => {
            let credentials = load_credentials(&settings, &store).await?;
            run(command, credentials).await
        }
    }
}

async fn authorize(settings: &Settings, store: &CredentialStore) -> Result<()> {
    let api = Api::new(settings.api.clone())?;
    let application = match settings.consumer() {
        Ok((key, secret)) => {
            let application = ApplicationCredentials::with_api(api, key, secret)?;
            store.save_application(&application).await?;
            application
        }
        Err(e) => store
            .load_application()
            .await?
            .ok_or(e)?
            .into_credentials(api)?,
    };

    let temporary = application
        .request(None)
        .await
        .context("requesting a request token")?;

    println!("Open this page, approve the application and enter the PIN:");
    println!("{}", temporary.authorization_url());
    print!("PIN: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut pin = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut pin).await?;
    if pin.trim().is_empty() {
        bail!("no PIN entered");
    }

    let token = temporary
        .confirm(pin.trim())
        .await
        .context("exchanging the PIN for an access token")?;
    store.save_token(&settings.profile, &token).await?;

    println!(
        "Authorized as @{} (profile {})",
        token.screen_name().unwrap_or("?"),
        settings.profile
    );
    Ok(())
}

async fn profiles(store: &CredentialStore, remove: Option<String>) -> Result<()> {
    if let Some(profile) = remove {
        if !store.remove_token(&profile).await? {
            bail!("no such profile: {}", profile);
        }
        println!("Removed {}", profile);
        return Ok(());
    }

    for summary in store.list_profiles().await? {
        println!(
            "{:<16} @{:<20} {}",
            summary.profile,
            summary.screen_name.as_deref().unwrap_or("?"),
            summary.saved_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn load_credentials(settings: &Settings, store: &CredentialStore) -> Result<SharedCredentials> {
    let api = Api::new(settings.api.clone())?;
    let stored = store.load_token(&settings.profile).await?.with_context(|| {
        format!(
            "no token stored for profile {}; run `chirp authorize` first",
            settings.profile
        )
    })?;
    Ok(Arc::new(stored.into_credentials(api)?))
}

async fn run(command: Command, credentials: SharedCredentials) -> Result<()> {
    match command {
        Command::Whoami => {
            let account = chirp_core::Account::new(credentials);
            let me = account.verify_credentials().await?;
            println!(
                "@{} ({}) id={} followers={} statuses={}",
                me.screen_name, me.name, me.id, me.followers_count, me.statuses_count
            );
        }
        Command::Timeline => {
            for status in &PublicTimeline::new(credentials).load().await? {
                print_status(status);
            }
        }
        Command::Show { id } => print_status(&Status::show(&credentials, id).await?),
        Command::Post { text, reply_to } => {
            let mut new_status = NewStatus::new(text);
            new_status.in_reply_to_status_id = reply_to;
            print_status(&Status::update(&credentials, new_status).await?);
        }
        Command::Retweet { id } => {
            let status = Status::show(&credentials, id).await?;
            print_status(&status.retweet().await?);
        }
        Command::Delete { id } => {
            let status = Status::show(&credentials, id).await?;
            let deleted = status.destroy().await?;
            println!("Deleted {}", deleted.id);
        }
        Command::Sample { limit } => follow(Stream::sample(credentials), limit).await?,
        Command::Filter {
            follow: ids,
            track,
            limit,
        } => {
            let filter = FilterParams {
                follow: ids,
                track,
                ..Default::default()
            };
            follow(Stream::filter(credentials, filter), limit).await?
        }
        Command::Authorize | Command::Profiles { .. } => {
            bail!("command does not use a stored token")
        }
    }
    Ok(())
}

/// Print stream messages until the limit, the end of the stream or Ctrl-C
async fn follow(stream: Stream, limit: Option<usize>) -> Result<()> {
    let mut messages = stream.open().await?;
    let mut seen = 0;

    loop {
        let item = tokio::select! {
            item = messages.next() => item,
            _ = tokio::signal::ctrl_c() => break,
        };
        match item {
            Some(Ok(Message::Status(status))) => print_status(&status),
            Some(Ok(Message::Delete { id, .. })) => println!("[deleted {}]", id),
            Some(Ok(Message::Limit { track })) => println!("[{} statuses withheld]", track),
            Some(Ok(other)) => info!(kind = other.kind(), "Ignoring stream message"),
            Some(Err(e)) => {
                warn!("Skipping stream line: {}", e);
                continue;
            }
            None => break,
        }

        seen += 1;
        if limit.is_some_and(|limit| seen >= limit) {
            break;
        }
    }
    Ok(())
}

fn print_status(status: &Model<Status>) {
    let author = status
        .user
        .as_ref()
        .map(|user| user.screen_name.as_str())
        .unwrap_or("?");
    println!("{} @{}: {}", status.id, author, status.text);
}
