use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use promptify_server::config::{AppConfig, CliConfig, FileConfig};
use promptify_server::curator::llm::{CompletionOptions, LlmProvider, OpenAIProvider};
use promptify_server::curator::Curator;
use promptify_server::resolver::SpotifyCatalog;
use promptify_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use promptify_server::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the directory holding the SQLite user database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML configuration file. File values override CLI values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
    };
    let config = AppConfig::resolve(&cli, file_config)?;

    info!("Opening SQLite user database at {:?}...", config.user_db_path());
    let user_store = Arc::new(SqliteUserStore::new(&config.user_db_path())?);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let llm_provider: Arc<dyn LlmProvider> = match &config.llm.api_key_command {
        Some(command) => Arc::new(OpenAIProvider::with_key_command(
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            command.clone(),
        )),
        None => {
            if config.llm.api_key.is_none() {
                warn!("No LLM API key configured, generation requests will be unauthenticated");
            }
            Arc::new(OpenAIProvider::new(
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                config.llm.api_key.clone(),
            ))
        }
    };
    info!(
        "Recommendation generation via {} at {}",
        config.llm.model, config.llm.base_url
    );

    let completion_options = CompletionOptions {
        temperature: config.llm.temperature,
        timeout: std::time::Duration::from_secs(config.llm.timeout_secs),
        ..Default::default()
    };
    let curator = Arc::new(Curator::with_options(llm_provider, completion_options));

    info!("Catalog search at {}", config.catalog.base_url);
    let catalog = Arc::new(SpotifyCatalog::new(
        config.catalog.base_url.clone(),
        config.catalog.timeout_secs,
    ));

    let server_config = ServerConfig {
        port: config.port,
        requests_logging_level: config.logging_level.clone(),
        frontend_dir_path: config.frontend_dir_path.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, user_store, curator, catalog).await
}
