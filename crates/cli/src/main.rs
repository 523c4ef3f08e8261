use std::sync::Arc;

use {
    clap::Parser,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    cookiegate_browser::HeadlessChromeSource,
    cookiegate_gateway::{server::start_gateway, state::GatewayState},
};

#[derive(Parser)]
#[command(name = "cookiegate", about = "Cookiegate — one-shot cookie extraction gateway")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Target site whose cookies are served (overrides config value).
    #[arg(long, env = "TARGET_URL")]
    target_url: Option<String>,

    /// Run the browser with a visible window (for local debugging).
    #[arg(long, default_value_t = false)]
    headed: bool,
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

    info!(version = env!("CARGO_PKG_VERSION"), "cookiegate starting");

    // Config file + env overrides first, CLI args win over both.
    let mut config = cookiegate_config::discover_and_load();
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = cli.target_url {
        config.browser.target_url = url;
    }
    if cli.headed {
        config.browser.headless = false;
    }

    info!(
        target_url = %config.browser.target_url,
        headless = config.browser.headless,
        "browser collaborator configured"
    );

    let source = Arc::new(HeadlessChromeSource::new(config.browser));
    let state = GatewayState::new(config.server, source);
    start_gateway(state).await
}
