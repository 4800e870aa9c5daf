use std::sync::Arc;

use lift_common::config::Config;
use lift_common::error::ProbeError;
use lift_common::models::{Method, ProbeTarget, ScanMode};
use lift_core::probe::tls::TlsProber;
use lift_core::{ProbeEngine, SignatureStore};

use crate::utils::{LOCALHOST, http_response, refused_port, serve_tcp, silent_tcp};

async fn engine(http_fallback_port: u16, rtsp_port: u16) -> ProbeEngine {
    let config = Config {
        http_fallback_port,
        rtsp_port,
        ..Config::default()
    };
    ProbeEngine::new(config, Arc::new(SignatureStore::default())).unwrap()
}

/// TLS refused on the target port, so the chain falls back to plain HTTP.
#[tokio::test]
async fn failed_tls_falls_back_to_http_heuristics() {
    let (http_port, _server) = serve_tcp(http_response("DVRDVS-Webs", "index")).await;
    let engine = engine(http_port, refused_port().await).await;

    let result = engine.fingerprint_tls(LOCALHOST, refused_port().await).await;

    assert_eq!(result.matched_label.as_deref(), Some("Hikvision-based DVR"));
    assert_eq!(result.method, Method::Http);
}

#[tokio::test]
async fn unmatched_response_is_kept_as_observation() {
    let (http_port, _server) = serve_tcp(http_response("nginx/1.24.0", "Welcome to nginx!")).await;
    let engine = engine(http_port, refused_port().await).await;

    let result = engine.fingerprint_tls(LOCALHOST, refused_port().await).await;

    assert!(!result.is_identified());
    assert_eq!(result.method, Method::Http);
    let observation = result.observation.expect("the HTTP response was received");
    assert_eq!(observation.title.as_deref(), Some("Welcome to nginx!"));
    assert_eq!(observation.server.as_deref(), Some("nginx/1.24.0"));
}

#[tokio::test]
async fn rtsp_banner_identifies_when_http_is_silent() {
    let (rtsp_port, _server) =
        serve_tcp("RTSP/1.0 200 OK\r\nCSeq: 1\r\nServer: Dahua Rtsp Server\r\nPublic: OPTIONS, DESCRIBE\r\n\r\n").await;
    let engine = engine(refused_port().await, rtsp_port).await;

    let result = engine.fingerprint_tls(LOCALHOST, refused_port().await).await;

    assert_eq!(result.matched_label.as_deref(), Some("Dahua RTSP Server"));
    assert_eq!(result.method, Method::Rtsp);
}

#[tokio::test]
async fn nothing_answering_is_unidentified_not_failed() {
    let engine = engine(refused_port().await, refused_port().await).await;
    let target = ProbeTarget {
        seq: 0,
        addr: LOCALHOST,
        port: refused_port().await,
        mode: ScanMode::Fingerprint,
    };

    let report = engine.probe_target(&target).await;

    assert!(report.is_success());
    let fingerprint = report.fingerprint.unwrap();
    assert!(!fingerprint.is_identified());
    assert!(!fingerprint.is_reportable(true));
}

#[tokio::test]
async fn http_port_skips_tls() {
    let (http_port, _server) = serve_tcp(http_response("Boa/0.94.14rc21", "Web Service")).await;
    let engine = engine(refused_port().await, refused_port().await).await;

    let result = engine.fingerprint_http(LOCALHOST, http_port).await;

    assert_eq!(result.matched_label.as_deref(), Some("Dahua-based DVR (Boa)"));
    assert_eq!(result.port, http_port);
}

#[tokio::test]
async fn tls_against_plaintext_server_is_a_handshake_failure() {
    let (port, _server) = serve_tcp(http_response("lighttpd", "AirOS")).await;
    let prober = TlsProber::new(Arc::new(SignatureStore::default()), Config::default().timeouts.connect).unwrap();

    let err = prober.probe(LOCALHOST, port).await.unwrap_err();
    assert!(matches!(err, ProbeError::HandshakeFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn tls_handshake_is_bounded_by_the_connect_timeout() {
    let (port, _server) = silent_tcp().await;
    let prober = TlsProber::new(Arc::new(SignatureStore::default()), std::time::Duration::from_millis(300)).unwrap();

    let started = tokio::time::Instant::now();
    let err = prober.probe(LOCALHOST, port).await.unwrap_err();

    assert!(matches!(err, ProbeError::Timeout { .. }), "got {err:?}");
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}
