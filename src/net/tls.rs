//! TLS configuration, certificate loading, and stream unification.

use std::io::BufReader;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// Error type for TLS setup.
#[derive(Debug)]
pub enum TlsError {
    /// Certificate or key file missing/unreadable.
    Io(std::io::Error),
    /// No usable private key in the key file.
    NoPrivateKey(String),
    /// rustls rejected the certificate/key material.
    BadMaterial(tokio_rustls::rustls::Error),
}

impl std::fmt::Display for TlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsError::Io(e) => write!(f, "Failed to read TLS material: {}", e),
            TlsError::NoPrivateKey(path) => write!(f, "No private key found in {}", path),
            TlsError::BadMaterial(e) => write!(f, "Invalid TLS material: {}", e),
        }
    }
}

impl std::error::Error for TlsError {}

/// Load certificate chain and private key from PEM files and build an
/// acceptor. Done once at startup; handshakes share the config via `Arc`.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, TlsError> {
    let cert_file = std::fs::File::open(cert_path).map_err(TlsError::Io)?;
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<_, _>>()
        .map_err(TlsError::Io)?;

    let key_file = std::fs::File::open(key_path).map_err(TlsError::Io)?;
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(TlsError::Io)?
        .ok_or_else(|| TlsError::NoPrivateKey(key_path.display().to_string()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(TlsError::BadMaterial)?;

    tracing::info!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        "TLS acceptor configured"
    );
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Coarse classification of a failed handshake, for logging.
pub fn classify_handshake_error(err: &std::io::Error) -> &'static str {
    match err.kind() {
        std::io::ErrorKind::UnexpectedEof => "peer closed during handshake",
        std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
            "connection reset during handshake"
        }
        std::io::ErrorKind::InvalidData => "tls protocol error",
        _ => "handshake failed",
    }
}

/// A connection stream, plain or TLS, behind one type so the session does
/// not care which transport it is driving.
pub enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_flush(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
