//! `cbw`: query the CBW API from the command line.
//!
//! Credentials come from `CBW_API_URL`, `CBW_API_KEY`, `CBW_SECRET_KEY`
//! and optionally `CBW_VERIFY_SSL`. Results are printed as JSON.

use std::process::ExitCode;

use cbw_core::pager::{PAGE_PARAM, PER_PAGE_PARAM};
use cbw_core::routes::*;
use cbw_core::{ApiError, CbwClient, ClientConfig, Endpoint, ExpectedStatus, HttpMethod, Params, Record};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cbw", version, about = "Query the CBW API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check connectivity and credentials
    Ping,
    /// List a collection, following every page unless --page is given
    List {
        collection: Collection,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Fetch one item of a collection
    Get { collection: Collection, id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Servers,
    Agents,
    Hosts,
    Groups,
    Users,
    Nodes,
    SecurityIssues,
    CveAnnouncements,
    RemoteAccesses,
    ComplianceServers,
    ComplianceRules,
}

impl Collection {
    fn route(self) -> &'static str {
        match self {
            Collection::Servers => ROUTE_SERVERS,
            Collection::Agents => ROUTE_AGENTS,
            Collection::Hosts => ROUTE_HOSTS,
            Collection::Groups => ROUTE_GROUPS,
            Collection::Users => ROUTE_USERS,
            Collection::Nodes => ROUTE_NODES,
            Collection::SecurityIssues => ROUTE_SECURITY_ISSUES,
            Collection::CveAnnouncements => ROUTE_CVE_ANNOUNCEMENTS,
            Collection::RemoteAccesses => ROUTE_REMOTE_ACCESSES,
            Collection::ComplianceServers => ROUTE_COMPLIANCE_ASSETS,
            Collection::ComplianceRules => ROUTE_COMPLIANCE_RULES,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            // A bad URL or missing credentials will fail the same way on
            // every retry.
            if err.is_configuration() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<String, ApiError> {
    let client = CbwClient::new(ClientConfig::from_env()?);
    let record = match cli.command {
        Command::Ping => client.ping()?,
        Command::List { collection, page, per_page } => {
            let mut params = Params::new();
            if let Some(page) = page {
                params.insert(PAGE_PARAM.to_string(), page.to_string());
            }
            if let Some(per_page) = per_page {
                params.insert(PER_PAGE_PARAM.to_string(), per_page.to_string());
            }
            Record::from(client.fetch_all(HttpMethod::Get, collection.route(), &params)?)
        }
        Command::Get { collection, id } => {
            let endpoint = Endpoint::new(HttpMethod::Get, collection.route()).segment(id);
            client.send_record(&endpoint, ExpectedStatus::Exactly(200))?
        }
    };
    serde_json::to_string_pretty(&record).map_err(|e| ApiError::Serialization(e.to_string()))
}
