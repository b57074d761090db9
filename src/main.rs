use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

use contact_relay::config::RelayConfig;
use contact_relay::server::{self, AppState};

/// Relay website form submissions as email
#[derive(Parser)]
#[command(name = "contact-relay")]
#[command(about = "Stateless relay that turns contact-form submissions into email", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8787")]
    port: u16,

    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug", // -vvv shows everything including dependencies
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    let config = RelayConfig::from_env();
    info!(
        provider = if config.primary_provider_configured() {
            "resend"
        } else {
            "mailchannels"
        },
        challenge_verification = config.turnstile_secret.is_some(),
        delivery_configured = config.delivery_configured(),
        "loaded relay configuration"
    );
    if !config.delivery_configured() {
        debug!("CONTACT_TO_EMAIL or CONTACT_FROM_EMAIL missing; submissions will be refused");
    }

    let state = Arc::new(AppState::new(config));
    let app = server::router(state);

    let addr = format!("{}:{}", cli.bind, cli.port);
    info!("Starting contact relay on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
