use std::time::Duration;

pub const HTTP_PORT: u16 = 80;
pub const RTSP_PORT: u16 = 554;
pub const DNS_PORT: u16 = 53;
pub const NTP_PORT: u16 = 123;
pub const SSDP_PORT: u16 = 1900;

/// Upper bounds for every suspension point of a probe chain.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// TCP connect and TLS handshake, each.
    pub connect: Duration,
    /// Whole HTTP request, body included.
    pub http: Duration,
    /// RTSP connect plus reply.
    pub rtsp: Duration,
    /// Wait for a reply to a UDP reflection probe.
    pub reflection: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            http: Duration::from_secs(10),
            rtsp: Duration::from_secs(5),
            reflection: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Reports unidentified HTTP services and logs every fall-through reason.
    pub verbose: bool,
    /// Number of targets probed at the same time.
    pub workers: usize,
    /// Plaintext port tried when TLS or HTTPS fails.
    pub http_fallback_port: u16,
    pub rtsp_port: u16,
    pub dns_port: u16,
    pub ssdp_port: u16,
    pub ntp_port: u16,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            workers: 32,
            http_fallback_port: HTTP_PORT,
            rtsp_port: RTSP_PORT,
            dns_port: DNS_PORT,
            ssdp_port: SSDP_PORT,
            ntp_port: NTP_PORT,
            timeouts: Timeouts::default(),
        }
    }
}
