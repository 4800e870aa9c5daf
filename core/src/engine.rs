//! # Probe Engine
//!
//! Runs the probes the dispatcher selects for one target and folds their
//! outcomes into a [`TargetReport`].
//!
//! The fingerprint chain stops at the first identification:
//!
//! 1. TLS certificate lookup (non-HTTP ports only).
//! 2. HTTP(S) `GET /`, matched against the signature store, then the
//!    heuristic table. Only network failures move on to the next scheme.
//! 3. RTSP `OPTIONS` banner grab.
//!
//! A failed probe never fails the target. It is logged at debug level and the
//! next step runs.

use std::net::IpAddr;
use std::sync::Arc;

use lift_common::config::Config;
use lift_common::models::{Method, ProbeResult, ProbeTarget, ReflectionVerdict, TargetReport};
use tracing::debug;

use crate::dispatch::{self, ProbeKind};
use crate::network::udp::{TokioUdp, UdpExchange};
use crate::probe::http::{HttpProber, HttpResponse, Scheme};
use crate::probe::tls::TlsProber;
use crate::probe::rtsp;
use crate::reflection::{DnsProbe, NtpProbe, ReflectionCheck, ReflectionProbe, SsdpProbe};
use crate::rules;
use crate::signatures::SignatureStore;

pub struct ProbeEngine {
    config: Config,
    store: Arc<SignatureStore>,
    tls: TlsProber,
    http: HttpProber,
    transport: Arc<dyn UdpExchange>,
}

impl ProbeEngine {
    pub fn new(config: Config, store: Arc<SignatureStore>) -> anyhow::Result<Self> {
        let tls = TlsProber::new(store.clone(), config.timeouts.connect)?;
        let http = HttpProber::new(&config.timeouts)?;

        Ok(Self {
            config,
            store,
            tls,
            http,
            transport: Arc::new(TokioUdp),
        })
    }

    /// Replaces the datagram transport of the reflection checks.
    pub fn with_transport(mut self, transport: Arc<dyn UdpExchange>) -> Self {
        self.transport = transport;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SignatureStore {
        &self.store
    }

    pub async fn probe_target(&self, target: &ProbeTarget) -> TargetReport {
        let kinds = dispatch::select(target.port, target.mode.recurse(), target.mode.recon());
        debug!("{}: running {kinds:?}", target.socket_addr());

        let mut fingerprint: Option<ProbeResult> = None;
        let mut verdicts: Vec<ReflectionVerdict> = Vec::new();

        for kind in kinds {
            match kind {
                ProbeKind::HttpFingerprint => {
                    fingerprint = Some(self.fingerprint_http(target.addr, target.port).await);
                }
                ProbeKind::TlsFingerprint => {
                    fingerprint = Some(self.fingerprint_tls(target.addr, target.port).await);
                }
                ProbeKind::DnsReflection => {
                    let probe = DnsProbe::new(self.config.dns_port);
                    verdicts.push(self.reflect(&probe, target.addr).await);
                }
                ProbeKind::SsdpReflection => {
                    let probe = SsdpProbe::new(self.config.ssdp_port);
                    verdicts.push(self.reflect(&probe, target.addr).await);
                }
                ProbeKind::NtpReflection => {
                    let probe = NtpProbe::new(self.config.ntp_port);
                    verdicts.push(self.reflect(&probe, target.addr).await);
                }
            }
        }

        TargetReport::completed(target, fingerprint, verdicts)
    }

    /// Certificate first; HTTPS on the same port and plain HTTP on the
    /// fallback port when the certificate is unknown.
    pub async fn fingerprint_tls(&self, ip: IpAddr, port: u16) -> ProbeResult {
        let fallback = (Scheme::Http, self.config.http_fallback_port);

        let (schemes, handshake_done) = match self.tls.probe(ip, port).await {
            Ok(tls) => match tls.device {
                Some(label) => return ProbeResult::identified(ip, port, label, Method::TlsCertificate),
                None => {
                    debug!("{ip}:{port} certificate is not in the signature store");
                    (vec![(Scheme::Https, port), fallback], true)
                }
            },
            Err(e) => {
                debug!("{ip}:{port} TLS probe failed: {e}");
                (vec![fallback], false)
            }
        };

        let result = self.fingerprint_schemes(ip, port, &schemes).await;

        if handshake_done && result.observation.is_none() && !result.is_identified() {
            // The certificate is the only data this target produced.
            return ProbeResult::unidentified(ip, port, Method::TlsCertificate, None);
        }
        result
    }

    /// Plain HTTP on the target port.
    pub async fn fingerprint_http(&self, ip: IpAddr, port: u16) -> ProbeResult {
        self.fingerprint_schemes(ip, port, &[(Scheme::Http, port)]).await
    }

    async fn fingerprint_schemes(&self, ip: IpAddr, port: u16, schemes: &[(Scheme, u16)]) -> ProbeResult {
        let mut response: Option<HttpResponse> = None;

        for &(scheme, scheme_port) in schemes {
            match self.http.fetch(scheme, ip, scheme_port).await {
                Ok(received) => {
                    response = Some(received);
                    break;
                }
                Err(e) => debug!("{ip}:{scheme_port} {scheme} request failed: {e}"),
            }
        }

        if let Some(response) = &response {
            let method = response.scheme.method();
            if let Some(label) = self.match_response(response) {
                return ProbeResult::identified(ip, port, label, method);
            }
            debug!("{ip}: no signature or rule matched ({})", response.observation);
        }

        if let Some(result) = self.fingerprint_rtsp(ip, port).await {
            return result.with_observation(response.as_ref().map(|r| r.observation.clone()));
        }

        match response {
            Some(response) => {
                ProbeResult::unidentified(ip, port, response.scheme.method(), Some(response.observation))
            }
            None => ProbeResult::unidentified(ip, port, Method::Rtsp, None),
        }
    }

    /// Signature store first, heuristic table second.
    pub fn match_response(&self, response: &HttpResponse) -> Option<String> {
        let observation = &response.observation;

        if let Some(label) = self
            .store
            .lookup_by_http(observation.title.as_deref(), observation.server.as_deref())
        {
            return Some(rules::render_label(label, observation));
        }

        rules::identify(observation, &response.body)
    }

    async fn fingerprint_rtsp(&self, ip: IpAddr, port: u16) -> Option<ProbeResult> {
        match rtsp::probe(ip, self.config.rtsp_port, self.config.timeouts.rtsp).await {
            Ok(banner) => {
                let label = banner.device?;
                Some(ProbeResult::identified(ip, port, label, Method::Rtsp))
            }
            Err(e) => {
                debug!("{ip}:{} RTSP probe failed: {e}", self.config.rtsp_port);
                None
            }
        }
    }

    pub async fn reflect(&self, probe: &dyn ReflectionProbe, ip: IpAddr) -> ReflectionVerdict {
        ReflectionCheck::new(probe, self.transport.as_ref(), ip, self.config.timeouts.reflection)
            .run()
            .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::udp::Exchange;
    use crate::reflection::tests::Scripted;
    use lift_common::models::{Attack, HttpObservation, ReflectionOutcome, ScanMode, TargetStatus};
    use std::net::{Ipv4Addr, SocketAddr};

    const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 80));

    fn target(port: u16, mode: ScanMode) -> ProbeTarget {
        ProbeTarget {
            seq: 0,
            addr: TARGET,
            port,
            mode,
        }
    }

    fn engine_with(transport: Arc<Scripted>) -> ProbeEngine {
        ProbeEngine::new(Config::default(), Arc::new(SignatureStore::default()))
            .unwrap()
            .with_transport(transport)
    }

    #[tokio::test]
    async fn recurse_on_http_port_fingerprints_without_reflection() {
        let transport = Arc::new(Scripted::new(|_| Ok(Exchange::Reply(vec![0u8; 512]))));
        let engine = engine_with(transport.clone());
        let local = ProbeTarget {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ..target(80, ScanMode::Recurse)
        };

        let report = engine.probe_target(&local).await;

        assert_eq!(report.status, TargetStatus::Success);
        assert!(report.fingerprint.is_some());
        assert!(report.verdicts.is_empty());
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recurse_on_other_port_runs_the_three_checks_on_their_ports() {
        let transport = Arc::new(Scripted::new(|_| Ok(Exchange::Silence)));
        let engine = engine_with(transport.clone());

        let report = engine.probe_target(&target(443, ScanMode::Recurse)).await;

        assert!(report.is_success());
        assert!(report.fingerprint.is_none());
        let attacks: Vec<Attack> = report.verdicts.iter().map(|v| v.attack).collect();
        assert_eq!(attacks, [Attack::DnsAmplification, Attack::SsdpReflection, Attack::NtpMonlist]);
        assert!(report.verdicts.iter().all(|v| v.outcome == ReflectionOutcome::NotVulnerable));

        let ports: Vec<u16> = transport.sent.lock().unwrap().iter().map(|(addr, _)| addr.port()).collect();
        assert_eq!(ports, [53, 1900, 123]);
    }

    #[tokio::test]
    async fn ssdp_port_runs_only_the_ssdp_check() {
        let transport = Arc::new(Scripted::new(|_| Ok(Exchange::Reply(b"HTTP/1.1 200 OK\r\n\r\n".to_vec()))));
        let engine = engine_with(transport.clone());

        let report = engine.probe_target(&target(1900, ScanMode::Recurse)).await;

        assert_eq!(report.verdicts.len(), 1);
        assert!(report.verdicts[0].vulnerable());
        assert_eq!(transport.sent.lock().unwrap()[0].0, SocketAddr::new(TARGET, 1900));
    }

    #[test]
    fn store_match_beats_heuristics_and_fills_placeholders() {
        let store = SignatureStore::build([crate::signatures::SignatureDocument::new(
            "cams.json",
            r#"{"http_response_info": [{"server_search_text": "DVRDVS-Webs", "title_search_text": "", "display_name": "Hikvision DVR ({server})"}]}"#,
        )]);
        let engine = ProbeEngine::new(Config::default(), Arc::new(store)).unwrap();

        let response = HttpResponse {
            scheme: Scheme::Http,
            observation: HttpObservation {
                title: None,
                server: Some("DVRDVS-Webs".to_string()),
            },
            body: String::new(),
        };
        assert_eq!(engine.match_response(&response).as_deref(), Some("Hikvision DVR (DVRDVS-Webs)"));
    }

    #[test]
    fn heuristics_apply_when_store_has_no_match() {
        let engine = ProbeEngine::new(Config::default(), Arc::new(SignatureStore::default())).unwrap();
        let response = HttpResponse {
            scheme: Scheme::Https,
            observation: HttpObservation {
                title: Some("RouterOS login".to_string()),
                server: None,
            },
            body: String::new(),
        };
        assert_eq!(engine.match_response(&response).as_deref(), Some("MikroTik RouterOS"));
    }
}
