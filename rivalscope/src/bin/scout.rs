//! Scout CLI - competitor research from the terminal
//!
//! Usage:
//!   scout analyze "Firebase"
//!   scout history
//!   scout show <ID>
//!   scout rerun "Firebase"
//!   scout delete <ID>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use scout::auth::{AuthProvider, Session, StaticAuth, SupabaseAuth};
use scout::controller::{
    Completion, HistoryController, QueryController, QueryPage, ResultController, ViewState,
};
use scout::history::{HistoryStore, MemoryHistoryStore, RestHistoryStore};
use scout::render;
use scout::{AnalysisGateway, HttpGateway, ScoutConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// User id for the local store when none is configured
const LOCAL_USER: &str = "local";

#[derive(Parser, Debug)]
#[command(name = "scout", version, about = "Find and compare alternatives to a tool")]
struct Cli {
    /// Config file (default: ./scout.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep history in the local file instead of the remote store
    #[arg(long, global = true)]
    offline: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze competitors for a tool and save the query to history
    Analyze { query: String },
    /// List past queries, newest first
    History,
    /// Show the stored results of a past query
    Show { id: String },
    /// Run a query again without saving it
    Rerun { query: String },
    /// Delete a past query
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = ScoutConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(gateway = %config.gateway.base_url, remote_store = config.has_remote_store(), "Loaded configuration");

    let gateway: Arc<dyn AnalysisGateway> = Arc::new(
        HttpGateway::new(&config.gateway.base_url, config.gateway.timeout())
            .context("Failed to create gateway client")?,
    );
    let store = build_store(&config, cli.offline)?;

    match cli.command {
        Commands::Analyze { query } => analyze(&config, gateway, store, &query).await,
        Commands::History => history(store).await,
        Commands::Show { id } => show(&config, gateway, store, &id).await,
        Commands::Rerun { query } => rerun(&config, gateway, &query).await,
        Commands::Delete { id } => delete(store, &id).await,
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` raises the level
fn init_logging(verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbose)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn build_store(config: &ScoutConfig, offline: bool) -> Result<Arc<dyn HistoryStore>> {
    let store = &config.store;
    let fixed_session = store.user_id.as_ref().map(|user| {
        let session = Session::new(user);
        match &store.access_token {
            Some(token) => session.with_token(token),
            None => session,
        }
    });

    let (url, anon_key) = match (&store.url, &store.anon_key) {
        (Some(url), Some(key)) if !offline => (url, key),
        _ => {
            let session = fixed_session.unwrap_or_else(|| Session::new(LOCAL_USER));
            let auth = Arc::new(StaticAuth::signed_in(session));
            let local = MemoryHistoryStore::open(auth, store.history_cap, &store.local_path)
                .context("Failed to open local history")?;
            debug!(path = %store.local_path.display(), "Using local history");
            return Ok(Arc::new(local));
        }
    };

    let auth: Arc<dyn AuthProvider> = match fixed_session {
        Some(session) => Arc::new(StaticAuth::signed_in(session)),
        None => Arc::new(
            SupabaseAuth::new(url, anon_key, store.access_token.clone())
                .context("Failed to create auth client")?,
        ),
    };

    Ok(Arc::new(
        RestHistoryStore::new(url, anon_key, &store.table, auth)
            .context("Failed to create history store client")?,
    ))
}

async fn analyze(
    config: &ScoutConfig,
    gateway: Arc<dyn AnalysisGateway>,
    store: Arc<dyn HistoryStore>,
    query: &str,
) -> Result<()> {
    let controller = QueryController::new(QueryPage::new(config.max_query_length), gateway, store);
    let outcome = controller.submit(query).await;

    let mut page = controller.page().lock().await;
    print!("{}", render::render_query_page(&page));
    for notice in page.take_notices() {
        eprint!("{}", render::render_notice(&notice));
    }

    match outcome {
        Ok(Completion::Loaded) => Ok(()),
        Ok(_) => anyhow::bail!("analysis did not complete"),
        Err(e) => anyhow::bail!(e),
    }
}

async fn history(store: Arc<dyn HistoryStore>) -> Result<()> {
    let controller = HistoryController::new(store);
    controller.load().await;

    let page = controller.page().lock().await;
    print!("{}", render::render_history_page(&page));
    if let ViewState::Failed(message) = page.state() {
        anyhow::bail!("{}", message);
    }
    Ok(())
}

async fn show(
    config: &ScoutConfig,
    gateway: Arc<dyn AnalysisGateway>,
    store: Arc<dyn HistoryStore>,
    id: &str,
) -> Result<()> {
    let history = HistoryController::new(store);
    history.load().await;

    let params = {
        let page = history.page().lock().await;
        if let ViewState::Failed(message) = page.state() {
            anyhow::bail!("{}", message);
        }
        page.view(id)
    };
    if params.is_none() {
        eprintln!("{} {}", "No history entry with id".yellow(), id);
    }

    let controller = ResultController::open(params, config.max_query_length, gateway);
    controller.load().await?;
    print!("{}", render::render_result_page(&*controller.page().lock().await));
    Ok(())
}

async fn rerun(config: &ScoutConfig, gateway: Arc<dyn AnalysisGateway>, query: &str) -> Result<()> {
    let params = Some(scout::controller::NavParams::QueryText(query.to_string()));
    let controller = ResultController::open(params, config.max_query_length, gateway);
    let outcome = controller.load().await;

    print!("{}", render::render_result_page(&*controller.page().lock().await));
    match outcome? {
        Some(Completion::Failed) => anyhow::bail!("analysis failed"),
        _ => Ok(()),
    }
}

async fn delete(store: Arc<dyn HistoryStore>, id: &str) -> Result<()> {
    let controller = HistoryController::new(store);
    controller.load().await;
    controller.delete(id).await;

    let mut page = controller.page().lock().await;
    let notices = page.take_notices();
    for notice in &notices {
        eprint!("{}", render::render_notice(notice));
    }
    print!("{}", render::render_history_page(&page));

    if notices.iter().any(|n| n.level == scout::controller::NoticeLevel::Error) {
        anyhow::bail!("failed to delete {}", id);
    }
    Ok(())
}
