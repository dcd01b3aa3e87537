//! Error types for the IRC client.
//!
//! Protocol trouble is never an error here: malformed lines are parsed
//! leniently and unknown commands are ignored. What remains are the
//! failures a host process has to see: bad configuration, a transport
//! that cannot be opened, and a reconnection policy that has run out of
//! attempts.

use thiserror::Error;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Top-level client errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The configuration could not be turned into [`Settings`](crate::config::Settings).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transport failed to connect, upgrade or write.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Every reconnection attempt allowed by `MaxReconnectAttempts` was
    /// used without the client registering again.
    #[error("giving up after {attempts} reconnection attempts")]
    ReconnectExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The failure of the last attempt, when it could not even connect.
        #[source]
        source: Option<TransportError>,
    },
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required key is absent from every layer.
    #[error("missing required key: {0}")]
    Missing(&'static str),

    /// A key holds a value that cannot be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// The offending key.
        key: String,
        /// The raw value found.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// I/O error on the socket.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS negotiation or record processing failed.
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    /// The host name cannot be used for TLS server name indication.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// Client certificate material could not be loaded.
    #[error("client certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// The operation needs an open connection.
    #[error("not connected")]
    NotConnected,
}

/// Problems with client certificate material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CertificateError {
    /// The key file holds no usable private key.
    #[error("missing or invalid private key")]
    BadPrivateKey,

    /// The certificate file holds no usable certificate.
    #[error("missing or invalid certificate file")]
    BadCertificateFile,
}

impl TransportError {
    /// Whether this error is the non-blocking "try again" signal.
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::WouldBlock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::Missing("Hostname");
        assert_eq!(format!("{}", err), "missing required key: Hostname");

        let err = ConfigError::Invalid {
            key: "Port".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(format!("{}", err), "invalid value for Port: \"abc\"");
    }

    #[test]
    fn test_reconnect_exhausted_source() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = ClientError::ReconnectExhausted {
            attempts: 2,
            source: Some(io_err.into()),
        };

        assert_eq!(err.to_string(), "giving up after 2 reconnection attempts");
        let source = std::error::Error::source(&err);
        assert_eq!(source.unwrap().to_string(), "io error: connection refused");

        let dropped = ClientError::ReconnectExhausted {
            attempts: 3,
            source: None,
        };
        assert!(std::error::Error::source(&dropped).is_none());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let transport_err: TransportError = io_err.into();
        let client_err: ClientError = transport_err.into();

        match client_err {
            ClientError::Transport(TransportError::Io(_)) => {}
            _ => panic!("Expected Transport(Io) variant"),
        }
    }

    #[test]
    fn test_would_block() {
        let err: TransportError =
            std::io::Error::new(std::io::ErrorKind::WouldBlock, "again").into();
        assert!(err.is_would_block());
        assert!(!TransportError::NotConnected.is_would_block());
    }
}
