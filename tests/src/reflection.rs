use std::sync::Arc;
use std::time::Duration;

use lift_common::config::Config;
use lift_common::models::{Attack, ProbeTarget, ReflectionOutcome, ScanMode};
use lift_core::reflection::DnsProbe;
use lift_core::{ProbeEngine, SignatureStore};
use tokio::time::Instant;

use crate::utils::{LOCALHOST, dns_responder, silent_udp};

fn engine(config: Config) -> ProbeEngine {
    ProbeEngine::new(config, Arc::new(SignatureStore::default())).unwrap()
}

#[tokio::test]
async fn open_resolver_is_vulnerable() {
    let (dns_port, _server) = dns_responder().await;
    let engine = engine(Config {
        dns_port,
        ..Config::default()
    });

    let verdict = engine.reflect(&DnsProbe::new(dns_port), LOCALHOST).await;

    assert_eq!(verdict.attack, Attack::DnsAmplification);
    assert_eq!(verdict.outcome, ReflectionOutcome::Vulnerable);
    assert_eq!(verdict.to_string(), "127.0.0.1 is vulnerable to DNS amplification");
}

#[tokio::test]
async fn silence_is_not_vulnerable_after_the_full_wait() {
    let (dns_port, _socket) = silent_udp().await;
    let engine = engine(Config::default());

    let started = Instant::now();
    let verdict = engine.reflect(&DnsProbe::new(dns_port), LOCALHOST).await;
    let elapsed = started.elapsed();

    assert_eq!(verdict.outcome, ReflectionOutcome::NotVulnerable);
    assert!(elapsed >= Duration::from_secs(3), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(4), "returned after {elapsed:?}");
}

#[tokio::test]
async fn recurse_mode_on_dns_port_runs_only_the_dns_check() {
    let (dns_port, _server) = dns_responder().await;
    let engine = engine(Config {
        dns_port,
        ..Config::default()
    });
    let target = ProbeTarget {
        seq: 0,
        addr: LOCALHOST,
        port: 53,
        mode: ScanMode::Recurse,
    };

    let report = engine.probe_target(&target).await;

    assert!(report.is_success());
    assert_eq!(report.verdicts.len(), 1);
    assert!(report.verdicts[0].vulnerable());
}
