use std::sync::Arc;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    liaison_bridge::{Bridge, ReplySink},
    liaison_broker::{BrokerClient, BrokerSettings, IdentitySettings, TokenManager},
    liaison_config::{LiaisonConfig, Severity},
    liaison_gateway::{AppState, PlatformReplySink},
    liaison_platform::{PlatformClient, PlatformSettings},
    liaison_sessions::SqliteSessionDirectory,
    liaison_voice::{SttProvider, WhisperStt},
};

#[derive(Parser)]
#[command(
    name = "liaison",
    about = "Liaison — messaging-platform to conversational-AI bridge"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook gateway (default when no subcommand is provided).
    Serve,
    /// Validate the resolved configuration and exit.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "liaison starting");

    match cli.command {
        None | Some(Commands::Serve) => serve(cli).await,
        Some(Commands::Doctor) => doctor(),
    }
}

fn doctor() -> anyhow::Result<()> {
    let config = liaison_config::discover_and_load();
    let diagnostics = liaison_config::validate(&config);
    for d in &diagnostics {
        eprintln!("{}: {}: {}", d.severity, d.path, d.message);
    }
    if liaison_config::has_errors(&diagnostics) {
        anyhow::bail!("configuration is incomplete");
    }
    println!("configuration OK");
    Ok(())
}

async fn serve(cli: Cli) -> anyhow::Result<()> {
    let config = liaison_config::discover_and_load();
    let diagnostics = liaison_config::validate(&config);
    for d in &diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, "{}", d.message),
            Severity::Warning => warn!(path = d.path, "{}", d.message),
        }
    }
    if liaison_config::has_errors(&diagnostics) {
        anyhow::bail!("configuration is incomplete; run `liaison doctor` for details");
    }

    // CLI args override config values.
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);

    let state = build_state(config).await?;
    liaison_gateway::serve(&bind, port, state).await
}

/// Wire the collaborators from a validated config.
async fn build_state(config: LiaisonConfig) -> anyhow::Result<AppState> {
    let pool = sqlx::SqlitePool::connect(&config.storage.database_url)
        .await
        .context("failed to open session store")?;
    SqliteSessionDirectory::init(&pool)
        .await
        .context("failed to initialise session store schema")?;
    let directory = Arc::new(SqliteSessionDirectory::new(pool));

    let http = reqwest::Client::new();

    let broker = Arc::new(BrokerClient::new(
        http.clone(),
        BrokerSettings {
            base_url: config.broker.base_url,
            org: config.broker.org,
            env: config.broker.env,
            bot_key: config.broker.bot_key,
            api_key: config.broker.api_key.context("broker.api_key not set")?,
            channel: config.broker.channel,
            locale: config.broker.locale,
        },
    ));

    let tokens = Arc::new(TokenManager::new(
        http.clone(),
        IdentitySettings {
            token_url: config.identity.token_url,
            client_id: config.identity.client_id,
            client_secret: config
                .identity
                .client_secret
                .context("identity.client_secret not set")?,
        },
    ));

    let platform = Arc::new(PlatformClient::new(
        http,
        PlatformSettings {
            api_base: config.platform.api_base,
            content_base: config.platform.content_base,
            channel_token: config
                .platform
                .channel_token
                .context("platform.channel_token not set")?,
        },
    ));
    let replies: Arc<dyn ReplySink> = Arc::new(PlatformReplySink::new(Arc::clone(&platform)));

    let stt: Option<Arc<dyn SttProvider>> = config.transcription.api_key.map(|api_key| {
        Arc::new(WhisperStt::with_options(
            Some(api_key),
            config.transcription.api_base,
            config.transcription.model,
        )) as Arc<dyn SttProvider>
    });

    let bridge = Arc::new(Bridge::new(
        directory,
        broker,
        tokens,
        Arc::clone(&replies),
    ));

    Ok(AppState {
        bridge,
        platform,
        replies,
        stt,
        channel_secret: config.platform.channel_secret,
    })
}
