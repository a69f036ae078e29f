//! Framework errors
//!
//! Provider logic reports problems as [`crate::Diagnostic`]s. These errors
//! cover the plumbing underneath: the plugin handshake, the transport and the
//! msgpack/JSON value codecs.

#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid attribute path: {0}")]
    InvalidPath(String),

    #[error("Plugin handshake failed: {0}")]
    HandshakeError(String),

    #[error("TLS configuration error: {0}")]
    TlsError(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    TransportError(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, TfplugError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_names_the_path() {
        let err = TfplugError::TypeMismatch {
            path: "vlan_id".to_string(),
            expected: "number".to_string(),
            actual: "string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch at vlan_id: expected number, got string"
        );
    }

    #[test]
    fn io_errors_convert() {
        fn bind() -> Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address in use",
            ))?;
            Ok(())
        }
        let err = bind().unwrap_err();
        assert!(matches!(err, TfplugError::IoError(_)));
        assert_eq!(err.to_string(), "address in use");
    }
}
