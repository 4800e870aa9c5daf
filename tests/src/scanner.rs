use std::sync::Arc;
use std::time::Duration;

use lift_common::config::Config;
use lift_common::models::{ScanMode, TargetStatus};
use lift_core::{ProbeEngine, Scanner, Shutdown, SignatureStore};

use crate::utils::{LOOPBACK_2, http_response, refused_port, serve_tcp_at, silent_tcp};

async fn scanner(workers: usize) -> Scanner {
    scanner_with_fallback(workers, refused_port().await).await
}

async fn scanner_with_fallback(workers: usize, http_fallback_port: u16) -> Scanner {
    let config = Config {
        workers,
        http_fallback_port,
        rtsp_port: refused_port().await,
        ..Config::default()
    };
    let engine = ProbeEngine::new(config, Arc::new(SignatureStore::default())).unwrap();
    Scanner::new(Arc::new(engine))
}

/// The silent listener on 127.0.0.1 stalls the TLS handshake for the whole
/// connect timeout, long enough to interrupt the run in the middle of it.
/// 127.0.0.2 refuses that port and is identified over the HTTP fallback
/// before the interrupt.
#[tokio::test]
async fn interrupt_keeps_finished_results_and_aborts_in_flight() {
    let (port, _silent) = silent_tcp().await;
    let (http_port, _dvr) = serve_tcp_at(LOOPBACK_2, http_response("DVRDVS-Webs", "login")).await;
    let entries: Vec<String> = ["999.1.1.1", "127.0.0.2", "127.0.0.1", "127.0.0.1", "127.0.0.1"]
        .into_iter()
        .map(str::to_string)
        .collect();

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = trigger.send(true);
    });

    let run = scanner_with_fallback(1, http_port)
        .await
        .run(entries, port, ScanMode::Fingerprint, shutdown)
        .await;

    assert!(run.interrupted);
    let lines: Vec<String> = run.reports.iter().map(|r| r.status_line()).collect();
    assert_eq!(lines, ["999.1.1.1 : fail", "127.0.0.2 : success", "127.0.0.1 : aborted"]);

    let identified = run.reports[1].fingerprint.as_ref().and_then(|f| f.matched_label.as_deref());
    assert_eq!(identified, Some("Hikvision-based DVR"));
    assert_eq!(run.identified(), 1);
    assert_eq!(run.aborted(), 1);
    assert_eq!(run.not_started, 2);
}

#[tokio::test]
async fn completed_run_reports_every_entry() {
    let port = refused_port().await;
    let entries: Vec<String> = vec!["127.0.0.1".into(), "bogus".into(), "127.0.0.2".into()];
    let (_trigger, shutdown) = Shutdown::channel();

    let run = scanner(4).await.run(entries, port, ScanMode::Fingerprint, shutdown).await;

    assert!(!run.interrupted);
    assert_eq!(run.not_started, 0);
    let lines: Vec<String> = run.reports.iter().map(|r| r.status_line()).collect();
    assert_eq!(lines, ["127.0.0.1 : success", "bogus : fail", "127.0.0.2 : success"]);
    assert_eq!(run.identified(), 0);
}
