extern crate libsqlbackup;
#[macro_use]
extern crate log;

use clap::AppSettings;
use libsqlbackup::credentials::StaticToken;
use libsqlbackup::{
    default_provider, export, Config, Error, LocalClock, RestClient, TokenProvider,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "sqlbackup",
    about = "Starts a Cloud SQL export into Cloud Storage",
    global_settings = &[AppSettings::ColoredHelp]
)]
enum Command {
    /// Start an export of the instance named by CLOUD_SQL_INSTANCE_NAME
    Export {
        /// Export only this database (overrides DATABASE_NAME)
        #[structopt(long)]
        database: Option<String>,

        /// JSON payload of the triggering event
        #[structopt(long, parse(from_os_str))]
        event: Option<PathBuf>,

        /// Use this bearer token instead of application default credentials
        #[structopt(long)]
        access_token: Option<String>,

        /// Cloud SQL Admin API base URL
        #[structopt(long)]
        api_url: Option<String>,

        /// Print the request instead of sending it
        #[structopt(long)]
        dry_run: bool,
    },
    /// Print the configuration read from the environment
    ShowConfig,
}

fn run(command: Command) -> libsqlbackup::Result<()> {
    let config = Config::from_env()?;
    match command {
        Command::ShowConfig => {
            println!("{}", to_pretty(&config)?);
        }
        Command::Export {
            database,
            event,
            access_token,
            api_url,
            dry_run,
        } => {
            let config = config.with_database(database);
            let client = match api_url {
                Some(url) => RestClient::with_base_url(url),
                None => RestClient::new(),
            };
            if dry_run {
                let request = export::build_request(&config, &LocalClock);
                println!("POST {}", client.export_url(&config.project_id, &config.instance));
                println!("{}", to_pretty(&request)?);
                return Ok(());
            }
            let event = export::load_event(event.as_deref())?;
            let provider: Box<dyn TokenProvider> = match access_token {
                Some(token) => Box::new(StaticToken::new(token)),
                None => default_provider(|key| std::env::var(key).ok())?,
            };
            let operation = export::trigger_export(
                &event,
                &Value::Null,
                &config,
                &*provider,
                &client,
                &LocalClock,
            )?;
            println!("{}", to_pretty(&operation)?);
        }
    }
    Ok(())
}

fn to_pretty<T: serde::Serialize>(value: &T) -> libsqlbackup::Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| Error::Decode { source })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let command = Command::from_args();
    if let Err(e) = run(command) {
        error!("{}", e);
        process::exit(1);
    }
}
