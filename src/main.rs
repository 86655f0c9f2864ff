use std::{path::PathBuf, sync::Arc};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;

use capsweep::{
    auth::Session,
    config::{Config, PartialPolicy},
    details::{fetch_details, read_ids, write_details},
    info_time,
    process::harvest,
    request::HttpExecutor,
    Result, DEFAULT_OUTPUT,
};

#[derive(Parser)]
#[command(name = "capsweep", about = "Enumerate every record behind a capped search endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Auth {
    /// Bearer token of a logged-in session.
    #[arg(long, env = "CAPSWEEP_TOKEN")]
    token: String,
    /// Raw `Cookie` header of the same session (`a=1; b=2`).
    #[arg(long, env = "CAPSWEEP_COOKIE")]
    cookie: String,
    /// JSON config file; missing keys use the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Search every cell and write the merged records.
    Harvest {
        #[command(flatten)]
        auth: Auth,
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        out: PathBuf,
        #[arg(long)]
        min_width: Option<usize>,
        #[arg(long)]
        max_width: Option<usize>,
        /// `all`, `none` or comma separated category ids.
        #[arg(long)]
        allow_partial: Option<String>,
    },
    /// Fetch the full document of every record in a harvest output.
    Details {
        #[command(flatten)]
        auth: Auth,
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        input: PathBuf,
        #[arg(long, default_value = "data/details.json")]
        out: PathBuf,
    },
}

impl Auth {
    async fn load(&self) -> Result<(Config, Session)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).await?,
            None => Config::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        let session = Session::new(&config, &self.token, &self.cookie)?;
        Ok((config, session))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let cli = Cli::parse();

    match cli.command {
        Command::Harvest {
            auth,
            out,
            min_width,
            max_width,
            allow_partial,
        } => {
            let (mut config, session) = auth.load().await?;
            if let Some(w) = min_width {
                config.min_width = w;
            }
            if let Some(w) = max_width {
                config.max_width = w;
            }
            if let Some(raw) = allow_partial {
                config.allow_partial = PartialPolicy::parse(&raw)?;
            }

            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info_time!("Ctrl-C, stopping after the running cell(s)");
                    let _ = stop_tx.send(true);
                }
            });

            let executor = Arc::new(HttpExecutor::new(session, config.id_field.clone()));
            let result = harvest(executor, &config, stop_rx).await?;
            result.write_json(&out).await?;
        }
        Command::Details { auth, input, out } => {
            let (config, session) = auth.load().await?;
            let ids = read_ids(&input, &config.id_field).await?;
            let fetcher = Arc::new(HttpExecutor::new(session, config.id_field.clone()));
            let docs = fetch_details(fetcher, &ids, config.workers).await?;
            write_details(&out, &docs).await?;
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}
