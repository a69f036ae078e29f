use meraki::MerakiProvider;
use tfplug::ServerConfig;
use tracing_subscriber::EnvFilter;

/// Terraform reads the handshake from stdout, so logs go to stderr
fn init_logging(default_level: &str) {
    let directive = ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|level| level.trim().to_lowercase())
        .find(|level| {
            matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error"
            )
        })
        .unwrap_or_else(|| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> tfplug::Result<()> {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = ServerConfig::default();
    init_logging(config.log_level.as_str());

    tfplug::serve(MerakiProvider::new(), config).await
}
