use std::net::SocketAddr;
use std::path::PathBuf;

use branchwise::server::{self, ServerConfig};
use branchwise::{MemoryStore, SnapshotSource};
use clap::Parser;

/// Survey branching logic service.
#[derive(Debug, Parser)]
#[command(name = "branchwise", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BRANCHWISE_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Directory of `*.logic` survey files.
    #[arg(long, env = "BRANCHWISE_SURVEYS", default_value = "surveys")]
    surveys: PathBuf,

    /// Log filter, e.g. `info` or `branchwise=debug,tower_http=info`.
    #[arg(long, env = "BRANCHWISE_LOG", default_value = "info")]
    log: String,

    /// Validate the survey files and exit.
    #[arg(long)]
    check: bool,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("branchwise error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    let args = Args::parse();
    init_tracing(&args.log)?;

    if args.check {
        return check(&args.surveys);
    }

    server::serve(ServerConfig {
        bind: args.bind,
        surveys: args.surveys,
    })
    .await?;
    Ok(())
}

fn init_tracing(filter: &str) -> Result<(), BoxError> {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|error| format!("invalid log filter '{filter}': {error}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| format!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn check(dir: &std::path::Path) -> Result<(), BoxError> {
    let store = MemoryStore::new();
    server::load_surveys(&store, dir)?;
    for survey_id in store.survey_ids() {
        let Some(logic) = store.snapshot(&survey_id) else {
            continue;
        };
        let report = logic.validate();
        println!("{survey_id}: {logic}");
        for warning in report.warnings() {
            println!("  warning: {warning}");
        }
    }
    Ok(())
}
