//! Server module for running Terraform providers
//!
//! Starts the tfplugin6 gRPC server and performs the go-plugin handshake:
//! the magic cookie is checked, the server binds an ephemeral port on
//! localhost and the handshake line is written to stdout.

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::proto::ProviderServer;
use crate::provider::Provider;
use std::path::PathBuf;
use tonic::transport::{Identity, Server, ServerTlsConfig};

/// Environment variable Terraform sets when launching a plugin
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

const CORE_PROTOCOL_VERSION: u8 = 1;
const APP_PROTOCOL_VERSION: u8 = 6;

/// Log level for the provider process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to TLS certificate file; plaintext when unset
    pub cert_path: Option<PathBuf>,
    /// Path to TLS key file
    pub key_path: Option<PathBuf>,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Default log level when TF_LOG_PROVIDER / TF_LOG are unset
    pub log_level: LogLevel,
    /// Skip the magic cookie check (tests, debugging)
    pub skip_cookie_check: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: None,
            key_path: None,
            max_message_size: 256 << 20, // 256MB
            log_level: LogLevel::Info,
            skip_cookie_check: false,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the certificate path
    pub fn with_cert_path(mut self, path: PathBuf) -> Self {
        self.cert_path = Some(path);
        self
    }

    /// Set the key path
    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = Some(path);
        self
    }

    /// Set the maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn without_cookie_check(mut self) -> Self {
        self.skip_cookie_check = true;
        self
    }
}

/// Fails unless the process was launched by Terraform
pub fn check_magic_cookie() -> Result<()> {
    match std::env::var(MAGIC_COOKIE_KEY) {
        Ok(value) if value == MAGIC_COOKIE_VALUE => Ok(()),
        _ => Err(TfplugError::HandshakeError(
            "This binary is a plugin. These are not meant to be executed directly. \
             Please execute the program that consumes these plugins, which will \
             load any plugins automatically"
                .to_string(),
        )),
    }
}

/// The go-plugin handshake line
pub fn handshake_line(addr: std::net::SocketAddr) -> String {
    format!(
        "{}|{}|tcp|{}|grpc",
        CORE_PROTOCOL_VERSION, APP_PROTOCOL_VERSION, addr
    )
}

async fn load_tls_config(config: &ServerConfig) -> Result<Option<ServerTlsConfig>> {
    let (cert_path, key_path) = match (&config.cert_path, &config.key_path) {
        (Some(cert), Some(key)) => (cert, key),
        (None, None) => return Ok(None),
        _ => {
            return Err(TfplugError::TlsError(
                "both cert_path and key_path must be set to enable TLS".to_string(),
            ))
        }
    };

    // Already installed when another server ran in this process
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cert = tokio::fs::read(cert_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read certificate: {}", e)))?;
    let key = tokio::fs::read(key_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read key: {}", e)))?;

    Ok(Some(
        ServerTlsConfig::new().identity(Identity::from_pem(cert, key)),
    ))
}

/// Main entry point for running a provider
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    if !config.skip_cookie_check {
        check_magic_cookie()?;
    }

    let grpc_server = GrpcProviderServer::new(provider);
    let provider_service = ProviderServer::new(grpc_server)
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let mut builder = Server::builder();
    if let Some(tls_config) = load_tls_config(&config).await? {
        builder = builder.tls_config(tls_config)?;
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tracing::info!(%addr, tls = config.cert_path.is_some(), "provider server listening");
    println!("{}", handshake_line(addr));

    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    builder
        .add_service(provider_service)
        .serve_with_incoming_shutdown(incoming, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received interrupt, shutting down");
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_line_format() {
        let addr: std::net::SocketAddr = "127.0.0.1:43210".parse().unwrap();
        assert_eq!(handshake_line(addr), "1|6|tcp|127.0.0.1:43210|grpc");
    }

    #[test]
    fn default_config_is_plaintext() {
        let config = ServerConfig::default();
        assert!(config.cert_path.is_none());
        assert_eq!(config.max_message_size, 256 * 1024 * 1024);
        assert_eq!(config.log_level.as_str(), "info");
    }

    #[tokio::test]
    async fn tls_requires_both_paths() {
        let config = ServerConfig::new().with_cert_path(PathBuf::from("cert.pem"));
        let err = load_tls_config(&config).await.unwrap_err();
        assert!(matches!(err, TfplugError::TlsError(_)));
    }

    #[tokio::test]
    async fn no_paths_means_no_tls() {
        assert!(load_tls_config(&ServerConfig::default())
            .await
            .unwrap()
            .is_none());
    }
}
