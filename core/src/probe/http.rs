use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use lift_common::config::Timeouts;
use lift_common::error::ProbeError;
use lift_common::models::{HttpObservation, Method};
use lift_protocols::http as html;
use reqwest::header::SERVER;
use tracing::debug;

/// Bytes of a response body kept for matching. Titles sit near the top; the
/// rest of an oversized page is never read.
pub const BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn method(self) -> Method {
        match self {
            Scheme::Http => Method::Http,
            Scheme::Https => Method::Https,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// A received HTTP response, reduced to what matching needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub scheme: Scheme,
    pub observation: HttpObservation,
    /// Kept for extractors that look past the title.
    pub body: String,
}

pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeouts: &Timeouts) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.http)
            .build()
            .context("building HTTP client")?;

        Ok(Self { client })
    }

    /// `GET /` on the target. Any status counts as a response: embedded
    /// devices often answer with a 401 login page that still carries a title.
    pub async fn fetch(&self, scheme: Scheme, ip: IpAddr, port: u16) -> Result<HttpResponse, ProbeError> {
        let addr = SocketAddr::new(ip, port);
        let url = format!("{scheme}://{addr}/");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(addr, e))?;

        let status = response.status();
        let server = response
            .headers()
            .get(SERVER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut bytes: Vec<u8> = Vec::new();
        while bytes.len() < BODY_LIMIT {
            match response.chunk().await.map_err(|e| request_error(addr, e))? {
                Some(chunk) => bytes.extend_from_slice(&chunk),
                None => break,
            }
        }
        bytes.truncate(BODY_LIMIT);
        let body = String::from_utf8_lossy(&bytes).into_owned();
        let title = html::extract_title(&body);
        debug!("{url} answered {status}, title {title:?}, server {server:?}");

        Ok(HttpResponse {
            scheme,
            observation: HttpObservation { title, server },
            body,
        })
    }
}

fn request_error(addr: SocketAddr, e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout {
            addr,
            operation: "HTTP request",
        }
    } else if e.is_connect() {
        ProbeError::ConnectFailure {
            addr,
            source: io::Error::other(e),
        }
    } else {
        ProbeError::protocol("HTTP", e.to_string())
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
