//! # Signature Store
//!
//! Immutable index of known device signatures, built once before the first
//! probe is dispatched and shared read-only between workers.
//!
//! Two kinds of signature exist:
//! * **Exact**: the default TLS certificate a vendor ships, compared as
//!   canonical PEM text.
//! * **Substring**: a `(title, server)` pair of fragments searched for in an
//!   HTTP response.
//!
//! Load order matters. Substring rules are scanned in the order they were
//! loaded and the first hit wins, and when two documents carry the same
//! certificate the one loaded first keeps it.
//!
//! Documents are JSON objects with two optional arrays:
//!
//! ```json
//! {
//!   "ssl_cert_info": [{ "PEM_cert": "-----BEGIN CERTIFICATE-----...", "display_name": "..." }],
//!   "http_response_info": [{ "server_search_text": "...", "title_search_text": "...", "display_name": "..." }]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use lift_common::error::ProbeError;
use lift_protocols::pem;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Exact { cert: String },
    Substring { title: String, server: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignature {
    pub id: String,
    pub kind: MatchKind,
    pub display_name: String,
}

/// One signature document, with the name it is reported under.
#[derive(Debug, Clone)]
pub struct SignatureDocument {
    pub source: String,
    pub text: String,
}

impl SignatureDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

#[derive(Deserialize)]
struct DocumentBody {
    #[serde(default)]
    ssl_cert_info: Vec<Value>,
    #[serde(default)]
    http_response_info: Vec<Value>,
}

#[derive(Deserialize)]
struct CertRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "PEM_cert")]
    pem_cert: String,
    display_name: String,
}

#[derive(Deserialize)]
struct HttpRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    server_search_text: String,
    #[serde(default)]
    title_search_text: String,
    display_name: String,
}

#[derive(Debug, Default)]
pub struct SignatureStore {
    signatures: Vec<DeviceSignature>,
    by_cert: HashMap<String, usize>,
    http_rules: Vec<usize>,
    sources_loaded: usize,
    sources_skipped: usize,
}

impl SignatureStore {
    /// Ingests documents in order. Bad documents and bad records are logged
    /// and skipped; the build itself never fails.
    pub fn build(documents: impl IntoIterator<Item = SignatureDocument>) -> Self {
        let mut store = Self::default();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for document in documents {
            match store.ingest(&document, &mut seen_ids) {
                Ok(count) => {
                    debug!("Loaded {count} signatures from {}", document.source);
                    store.sources_loaded += 1;
                }
                Err(e) => {
                    warn!("{e}");
                    store.sources_skipped += 1;
                }
            }
        }

        store
    }

    /// Reads every `*.json` file of `dir` in file-name order.
    ///
    /// Only an unusable directory is an error. Unreadable files are skipped
    /// like invalid ones.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        ensure!(dir.is_dir(), "signature directory {} does not exist", dir.display());

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("reading signature directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut unreadable: usize = 0;
        let mut documents: Vec<SignatureDocument> = Vec::with_capacity(paths.len());
        for path in paths {
            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            match std::fs::read_to_string(&path) {
                Ok(text) => documents.push(SignatureDocument::new(source, text)),
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    unreadable += 1;
                }
            }
        }

        let mut store = Self::build(documents);
        store.sources_skipped += unreadable;

        info!(
            "Loaded {} signatures from {} sources ({} skipped)",
            store.len(),
            store.sources_loaded,
            store.sources_skipped
        );
        Ok(store)
    }

    /// Display name of the device shipping this certificate.
    pub fn lookup_by_cert(&self, cert_text: &str) -> Option<&str> {
        let canonical = pem::canonicalize(cert_text).ok()?;
        self.by_cert
            .get(&canonical)
            .map(|&index| self.signatures[index].display_name.as_str())
    }

    /// First substring rule, in load order, whose fragments both occur in the
    /// observed values. Absent values are searched as empty strings.
    pub fn lookup_by_http(&self, title: Option<&str>, server: Option<&str>) -> Option<&str> {
        let title = title.unwrap_or_default();
        let server = server.unwrap_or_default();

        self.http_rules
            .iter()
            .map(|&index| &self.signatures[index])
            .find(|signature| match &signature.kind {
                MatchKind::Substring {
                    title: title_text,
                    server: server_text,
                } => server.contains(server_text.as_str()) && title.contains(title_text.as_str()),
                MatchKind::Exact { .. } => false,
            })
            .map(|signature| signature.display_name.as_str())
    }

    pub fn signatures(&self) -> &[DeviceSignature] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn sources_loaded(&self) -> usize {
        self.sources_loaded
    }

    pub fn sources_skipped(&self) -> usize {
        self.sources_skipped
    }

    fn ingest(
        &mut self,
        document: &SignatureDocument,
        seen_ids: &mut HashSet<String>,
    ) -> Result<usize, ProbeError> {
        let body: DocumentBody =
            serde_json::from_str(&document.text).map_err(|e| ProbeError::SignatureLoad {
                source_name: document.source.clone(),
                reason: e.to_string(),
            })?;

        let before = self.signatures.len();

        for (n, value) in body.ssl_cert_info.into_iter().enumerate() {
            let default_id = format!("{}:cert:{n}", document.source);
            match parse_cert_record(value, default_id) {
                Ok(signature) => self.insert(signature, seen_ids),
                Err(reason) => skip_record(&document.source, "ssl_cert_info", n, &reason),
            }
        }

        for (n, value) in body.http_response_info.into_iter().enumerate() {
            let default_id = format!("{}:http:{n}", document.source);
            match parse_http_record(value, default_id) {
                Ok(signature) => self.insert(signature, seen_ids),
                Err(reason) => skip_record(&document.source, "http_response_info", n, &reason),
            }
        }

        Ok(self.signatures.len() - before)
    }

    fn insert(&mut self, signature: DeviceSignature, seen_ids: &mut HashSet<String>) {
        if !seen_ids.insert(signature.id.clone()) {
            warn!("Duplicate signature id {}, keeping the first one", signature.id);
            return;
        }

        let index = self.signatures.len();
        match &signature.kind {
            MatchKind::Exact { cert } => {
                // First file in name order keeps the certificate.
                self.by_cert.entry(cert.clone()).or_insert(index);
            }
            MatchKind::Substring { .. } => self.http_rules.push(index),
        }
        self.signatures.push(signature);
    }
}

fn parse_cert_record(value: Value, default_id: String) -> Result<DeviceSignature, String> {
    let record: CertRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let cert = pem::canonicalize(&record.pem_cert).map_err(|e| e.to_string())?;

    Ok(DeviceSignature {
        id: record.id.unwrap_or(default_id),
        kind: MatchKind::Exact { cert },
        display_name: record.display_name,
    })
}

fn parse_http_record(value: Value, default_id: String) -> Result<DeviceSignature, String> {
    let record: HttpRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;

    Ok(DeviceSignature {
        id: record.id.unwrap_or(default_id),
        kind: MatchKind::Substring {
            title: record.title_search_text,
            server: record.server_search_text,
        },
        display_name: record.display_name,
    })
}

fn skip_record(source: &str, section: &str, n: usize, reason: &str) {
    let error = ProbeError::SignatureLoad {
        source_name: format!("{source} ({section}[{n}])"),
        reason: reason.to_string(),
    };
    warn!("{error}");
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
