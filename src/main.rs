//! Pokefeed - Posts Pokemon Go map events to page feeds.
//!
//! This is the main entry point for pokefeed, which reads event records produced by
//! a map scanner and publishes one post per event on the feed of each configured page.
//!
//! # Overview
//!
//! Each configured alarm is bound to a page and to its access token. For every event
//! (a pokemon sighting, a lured pokestop or a gym changing team) the alarm fills the
//! templates of the event kind with the values of the event and posts the result.
//! When the session turns stale, the alarm reconnects once and posts again.
//!
//! # Features
//!
//! - **Templated Posts**: `<identifier>` placeholders filled from the event values
//! - **Per-Kind Overrides**: Replace any of the message, link, title or name templates
//! - **Multiple Pages**: Every alarm posts to its own page with its own token
//! - **Startup Announcement**: Optionally post a message when an alarm starts
//! - **Session Recovery**: Reconnect once when the provider rejects a stale session
//! - **YAML Configuration**: Simple configuration file format with environment variable support
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! alarms:
//!   - credential: "page-access-token"
//!     page_id: "157783561377843"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `POKEFEED_` prefix:
//!
//! ```bash
//! export POKEFEED_GRAPH__URL="https://graph.facebook.com/v2.8"
//! export POKEFEED_GRAPH__TIMEOUT_SECS=10
//! ```
//!
//! # Usage
//!
//! ```bash
//! scanner | pokefeed --config config.yaml
//! pokefeed --config config.yaml --events events.jsonl
//! ```
//!
//! # Architecture
//!
//! - [`alarm`] - Templates, alert profiles and the guarded dispatch of posts
//! - [`config`] - YAML configuration file structures and loading with environment variable support
//! - [`feed`] - Feed provider capability and its Graph API client
//! - [`runner`] - Reading event records and dispatching them to every alarm
//! - [`utils`] - Utility functions for substitution contexts
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//!   - Set to `debug` for verbose output
//!   - Set to `warn` or `error` for minimal logging

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use tokio::{
    fs::File,
    io::{self, BufReader},
};

use crate::{config::Config, feed::GraphClient, runner::Runner};

mod alarm;
mod config;
mod feed;
mod runner;
mod utils;

/// Command-line arguments for pokefeed.
///
/// Most configuration is done through the YAML file (see [`config::Config`]).
///
/// # Examples
///
/// ```bash
/// pokefeed --config config.yaml --events events.jsonl
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// Values can be overridden with `POKEFEED_` environment variables, e.g.
    /// `POKEFEED_GRAPH__TIMEOUT_SECS=10`.
    #[arg(short, long)]
    config: String,

    /// Path to a file of JSON event lines.
    ///
    /// Events are read from the standard input when omitted.
    #[arg(short, long)]
    events: Option<String>,
}

/// Main entry point for pokefeed.
///
/// 1. **Logging Setup**: `info` level by default, overridden by `RUST_LOG`
/// 2. **Argument Parsing**: Parses command-line arguments using `clap`
/// 3. **Configuration Loading**: Reads the YAML file and the environment overrides
/// 4. **Alarm Initialization**: Creates every valid alarm and sends the startup announcements
/// 5. **Event Processing**: Dispatches events until the end of input
///
/// Configuration errors and unreadable input stop the process with a non-zero exit
/// code. Failed posts are logged and never stop the processing.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting pokefeed {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load config file {}", args.config))?;

    let graph_client = GraphClient::new(&config.graph.url, config.graph.timeout())
        .context("failed to create the Graph API client")?;

    let runner = Runner::new(&config, || graph_client.clone())?;
    runner.announce().await;

    let stats = match &args.events {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("failed to open events file {}", path))?;
            runner.run(BufReader::new(file)).await
        }
        None => runner.run(BufReader::new(io::stdin())).await,
    }
    .context("failed to read events")?;

    info!(
        "{} events processed, {} posts delivered",
        stats.events, stats.delivered
    );

    Ok(())
}
