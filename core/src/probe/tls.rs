//! Certificate harvesting over a deliberately permissive TLS client.
//!
//! Embedded devices tend to speak TLS 1.0 with 1024-bit keys and SHA-1
//! signatures, so the connector lowers the OpenSSL security level to 0, allows
//! every protocol version and cipher and skips verification entirely.

use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lift_common::error::ProbeError;
use lift_protocols::pem;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;
use tracing::debug;

use crate::network::tcp;
use crate::signatures::SignatureStore;

const LEGACY_CIPHERS: &str = "ALL:@SECLEVEL=0";

/// What the TLS handshake revealed.
#[derive(Debug, Clone)]
pub struct TlsFingerprint {
    pub pem: String,
    pub device: Option<String>,
}

pub struct TlsProber {
    connector: SslConnector,
    store: Arc<SignatureStore>,
    limit: Duration,
}

impl TlsProber {
    /// `limit` bounds the TCP connect and the handshake separately.
    pub fn new(store: Arc<SignatureStore>, limit: Duration) -> anyhow::Result<Self> {
        let mut builder = SslConnector::builder(SslMethod::tls()).context("creating TLS context")?;
        // Devices ship self-signed certificates for whatever hostname.
        builder.set_verify(SslVerifyMode::NONE);
        builder
            .set_cipher_list(LEGACY_CIPHERS)
            .context("enabling legacy ciphers")?;
        builder
            .set_min_proto_version(None)
            .context("enabling legacy protocol versions")?;

        Ok(Self {
            connector: builder.build(),
            store,
            limit,
        })
    }

    pub async fn probe(&self, ip: IpAddr, port: u16) -> Result<TlsFingerprint, ProbeError> {
        let addr = SocketAddr::new(ip, port);
        let stream = tcp::connect(addr, self.limit).await?;
        debug!("Connected to {addr}, starting TLS handshake");

        let mut tls_stream = match timeout(self.limit, self.handshake(addr, stream)).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                return Err(ProbeError::Timeout {
                    addr,
                    operation: "TLS handshake",
                });
            }
        };

        let der = tls_stream
            .ssl()
            .peer_certificate()
            .and_then(|cert| cert.to_der().ok());

        // Best effort, the stream is dropped right after.
        let _ = tls_stream.shutdown().await;

        let der = der.ok_or_else(|| ProbeError::HandshakeFailed {
            addr,
            reason: "peer presented no certificate".to_string(),
        })?;

        let pem = pem::der_to_pem(&der);
        let device = self.store.lookup_by_cert(&pem).map(str::to_string);
        debug!("{addr} presented a certificate, known device: {device:?}");

        Ok(TlsFingerprint { pem, device })
    }

    async fn handshake(&self, addr: SocketAddr, stream: TcpStream) -> Result<SslStream<TcpStream>, ProbeError> {
        let failed = |reason: String| ProbeError::HandshakeFailed { addr, reason };

        let ssl = self
            .connector
            .configure()
            .and_then(|config| {
                config
                    .use_server_name_indication(false)
                    .verify_hostname(false)
                    .into_ssl(&addr.ip().to_string())
            })
            .map_err(|e| failed(e.to_string()))?;

        let mut tls_stream = SslStream::new(ssl, stream).map_err(|e| failed(e.to_string()))?;
        Pin::new(&mut tls_stream)
            .connect()
            .await
            .map_err(|e| failed(e.to_string()))?;

        Ok(tls_stream)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
