use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Text};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};
use weather_core::{
    Config, ErrorHandler, JsonFileLocationStore, LocationStore, SeniverseDataSource, Status,
    TextRow, WeatherDataSource, WeatherQueryController,
};

use crate::report::LastFailure;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather CLI")]
pub struct Cli {
    /// Log pipeline activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weather service API key.
    Configure,

    /// Show current weather for a location.
    Show {
        /// Location name, e.g. "beijing".
        location: String,

        /// Fail instead of asking whether to retry.
        #[arg(long)]
        no_prompt: bool,
    },

    /// Ask for locations one after another; repeating a name does not refetch.
    Interactive,

    /// List locations saved by earlier queries.
    Locations,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, no_prompt } => show(&location, !no_prompt).await,
            Command::Interactive => interactive().await,
            Command::Locations => locations().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    cfg.set_api_key(api_key.trim().to_string());
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Controller wired to the HTTP source and the on-disk location file.
struct Session {
    controller: WeatherQueryController,
    failures: Arc<LastFailure>,
}

impl Session {
    fn open() -> anyhow::Result<Self> {
        let cfg = Config::load()?;
        let query = cfg.query_config()?;

        let source = match cfg.endpoint.as_deref() {
            Some(endpoint) => SeniverseDataSource::with_endpoint(endpoint)?,
            None => SeniverseDataSource::new()?,
        };
        debug!(endpoint = source.endpoint(), "using weather service");
        let source: Arc<dyn WeatherDataSource> = Arc::new(source);
        let store: Arc<dyn LocationStore> =
            Arc::new(JsonFileLocationStore::new(Config::locations_file_path()?));
        let failures = Arc::new(LastFailure::default());

        let controller = WeatherQueryController::new(query, source, store)?
            .with_error_handler(Arc::clone(&failures) as Arc<dyn ErrorHandler>);

        Ok(Self { controller, failures })
    }

    /// Wait for the running fetch, offering retries while it keeps failing.
    async fn settle(
        &self,
        status: &mut watch::Receiver<Status>,
        location: &str,
        prompt: bool,
    ) -> anyhow::Result<bool> {
        loop {
            let settled = *status
                .wait_for(|s| matches!(s, Status::Success | Status::Error))
                .await
                .context("Weather controller shut down")?;

            if settled == Status::Success {
                return Ok(true);
            }

            let failure = self.failures.take();
            let message = failure
                .as_ref()
                .map(|f| f.message.as_str())
                .unwrap_or("unknown error");
            eprintln!("Weather query for '{location}' failed: {message}");

            let retryable = failure.is_some_and(|f| f.retryable);
            if !prompt || !retryable {
                debug!(location, retryable, "not offering a retry");
                return Ok(false);
            }
            let again = Confirm::new("Retry?")
                .with_default(true)
                .prompt()
                .context("Failed to read answer")?;
            if !again {
                return Ok(false);
            }
            info!(location, "retrying after failure");
            self.controller.retry();
        }
    }
}

async fn show(location: &str, prompt: bool) -> anyhow::Result<()> {
    if location.trim().is_empty() {
        bail!("Location must not be empty");
    }

    let session = Session::open()?;
    let mut status = session.controller.status().subscribe();
    let rows = session.controller.query(location);

    if !session.settle(&mut status, location, prompt).await? {
        bail!("No weather available for '{location}'");
    }
    print_rows(&rows.get());
    Ok(())
}

async fn interactive() -> anyhow::Result<()> {
    let session = Session::open()?;
    let mut status = session.controller.status().subscribe();
    println!("Enter a location, ':retry' to fetch the last one again, or an empty line to quit.");

    loop {
        let input = Text::new("Location:")
            .prompt()
            .context("Failed to read location")?;
        let input = input.trim();
        if input.is_empty() {
            break;
        }

        let rows = if input == ":retry" {
            let Some(last) = session.controller.last_requested_location() else {
                println!("Nothing to retry yet.");
                continue;
            };
            session.controller.retry();
            let Some(rows) = session.controller.rows() else {
                continue;
            };
            session.settle(&mut status, &last, false).await?;
            rows
        } else {
            let rows = session.controller.query(input);
            if status.has_changed().context("Weather controller shut down")? {
                session.settle(&mut status, input, false).await?;
            } else {
                debug!(location = input, "same location as last time, nothing fetched");
                println!("(unchanged)");
            }
            rows
        };

        print_rows(&rows.get());
    }

    session.controller.dispose();
    Ok(())
}

async fn locations() -> anyhow::Result<()> {
    let store = JsonFileLocationStore::new(Config::locations_file_path()?);
    let saved = store.list().await?;

    if saved.is_empty() {
        println!("No saved locations yet.");
        return Ok(());
    }
    debug!(path = %store.path().display(), count = saved.len(), "loaded saved locations");
    for location in saved {
        println!("{:<16} {}", location.name, location.path);
    }
    Ok(())
}

fn print_rows(rows: &[TextRow]) {
    for row in rows {
        println!("{:<12} {}", format!("{}:", row.label), row.value);
    }
}
