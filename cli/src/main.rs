//! `pb`: query a PocketBase server from the command line.
//!
//! Every subcommand prints the decoded response as pretty JSON on stdout.

use clap::{Args, Parser, Subcommand};
use pocketbase_core::{
    AdminAuthQuery, AdminsApi, ApiError, ClientConfig, CollectionsApi, HealthApi, ListQuery,
    RecordsApi, UreqTransport,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pb")]
#[command(version)]
#[command(about = "Query a PocketBase server")]
struct Cli {
    /// Base URL of the PocketBase server.
    #[arg(long, env = "POCKETBASE_URL", default_value = pocketbase_core::config::DEFAULT_BASE_URL)]
    url: String,

    /// Admin token sent as the Authorization header.
    #[arg(long, env = "POCKETBASE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = pocketbase_core::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the server is up.
    Health,

    /// Authenticate an admin and print the token.
    Auth {
        email: String,
        password: String,
        /// Comma separated fields to keep in the response.
        #[arg(long)]
        fields: Option<String>,
    },

    /// List admins, or view one with --id.
    Admins {
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// List collections, or view one with --name.
    Collections {
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// List the records of a collection, or view one with --id.
    Records {
        collection: String,
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Debug, Default, Args)]
struct ListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    per_page: Option<u32>,
    /// Sort columns, `-` prefix for descending (e.g. `-created,email`).
    #[arg(long)]
    sort: Option<String>,
    /// Filter expression (e.g. `email ~ 'example.com'`).
    #[arg(long)]
    filter: Option<String>,
    #[arg(long)]
    fields: Option<String>,
    /// Skip counting the total number of items.
    #[arg(long)]
    skip_total: bool,
}

impl ListArgs {
    fn to_query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            per_page: self.per_page,
            sort: self.sort.clone(),
            filter: self.filter.clone(),
            fields: self.fields.clone(),
            skip_total: self.skip_total,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("this command needs an admin token (--token or POCKETBASE_TOKEN)")]
    MissingToken,

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,pocketbase_core=debug,pb=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = ClientConfig {
        timeout_secs: cli.timeout,
        ..ClientConfig::new(&cli.url)
    };
    let transport = UreqTransport::new(&config)?;
    let base_url = config.base_url.as_str();
    debug!(base_url, "using PocketBase server");

    let token = || cli.token.as_deref().ok_or(CliError::MissingToken);

    match &cli.command {
        Command::Health => print(&HealthApi::new(base_url).check(&transport)?),
        Command::Auth {
            email,
            password,
            fields,
        } => {
            let query = AdminAuthQuery {
                email: email.clone(),
                password: password.clone(),
                fields: fields.clone(),
            };
            print(&AdminsApi::new(base_url).auth_with_password(&transport, &query)?)
        }
        Command::Admins { id, list } => {
            let admins = AdminsApi::new(base_url);
            match id {
                Some(id) => print(&admins.view(&transport, token()?, id, list.fields.as_deref())?),
                None => print(&admins.list(&transport, token()?, &list.to_query())?),
            }
        }
        Command::Collections { name, list } => {
            let collections = CollectionsApi::new(base_url);
            match name {
                Some(name) => print(&collections.view(&transport, token()?, name, list.fields.as_deref())?),
                None => print(&collections.list(&transport, token()?, &list.to_query())?),
            }
        }
        Command::Records {
            collection,
            id,
            list,
        } => {
            let records = RecordsApi::new(base_url, collection);
            let token = cli.token.as_deref();
            match id {
                Some(id) => print(&records.view(&transport, token, id, list.fields.as_deref())?),
                None => print(&records.list(&transport, token, &list.to_query())?),
            }
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
