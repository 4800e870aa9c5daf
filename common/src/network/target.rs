//! # Scan Target Model
//!
//! Defines the possible inputs for a run and turns them into entries.
//!
//! A run is fed by exactly one [`TargetSource`]:
//! * A single IP address.
//! * A file with one entry per line.
//! * A subnet: CIDR block (e.g., `192.168.1.0/24`), IPv4 range
//!   (e.g., `192.168.1.1-100`) or a comma-separated list of those.
//! * An autonomous system number, expanded through an [`AsnTable`].
//!
//! Entries stay plain strings until [`to_probe_target`] validates them, so a
//! malformed line from a file is reported as a failure instead of vanishing.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use pnet::ipnetwork::IpNetwork;
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::models::{ProbeTarget, ScanMode};
use crate::network::asn::AsnTable;
use crate::network::range::{self, IpCollection, Ipv4Range};
use crate::success;

/// Represents a distinct target expression.
#[derive(Clone, Debug)]
pub enum Target {
    /// A single specific host.
    Host { target_addr: IpAddr },
    /// A range of IPv4 addresses.
    Range { ipv4_range: Ipv4Range },
    /// Holds a list of different targets
    Multi { targets: Vec<Target> },
}

/// Where the entries of a run come from.
#[derive(Clone, Debug)]
pub enum TargetSource {
    Ip(String),
    File(PathBuf),
    Subnet(String),
    Asn { asn: u32, table: PathBuf },
}

impl FromStr for Target {
    type Err = String;

    /// Parses a string into a `Target`.
    ///
    /// Supported formats:
    /// * **Host**: Single IPv4/IPv6 address (e.g., "192.168.1.5").
    /// * **Range**: "Start-End" (e.g., "192.168.1.1-50", "192.168.1.1-192.168.1.50").
    /// * **CIDR**: "Network/Prefix" (e.g., "192.168.1.0/24").
    /// * **List**: any of the above separated by commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains(',') {
            return parse_commas(s).map_err(|e| e.to_string());
        }

        if let Some(target) = parse_host(s) {
            return Ok(target);
        }

        if let Some(target) = parse_ip_range(s)? {
            return Ok(target);
        }

        if let Some(target) = parse_cidr_range(s)? {
            return Ok(target);
        }

        Err(format!("invalid target: {s}"))
    }
}

fn resolve_target(target: Target, collection: &mut IpCollection) {
    match target {
        Target::Host { target_addr } => collection.add_single(target_addr),
        Target::Range { ipv4_range } => collection.add_range(ipv4_range),
        Target::Multi { targets } => {
            for target in targets {
                resolve_target(target, collection);
            }
        }
    }
}

/// Converts a single target into an IP collection.
pub fn to_collection(target: Target) -> IpCollection {
    let mut collection = IpCollection::new();
    resolve_target(target, &mut collection);
    collection
}

/// The entries of a run, produced one at a time.
///
/// Subnets and AS prefixes are expanded while the run consumes them, so a
/// `/8` never sits in memory as sixteen million strings.
pub struct Entries {
    len: usize,
    iter: Box<dyn Iterator<Item = String> + Send>,
}

impl Entries {
    /// Total number of entries, consumed or not.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for Entries {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.iter.next()
    }
}

impl From<Vec<String>> for Entries {
    fn from(entries: Vec<String>) -> Self {
        Self {
            len: entries.len(),
            iter: Box::new(entries.into_iter()),
        }
    }
}

impl From<IpCollection> for Entries {
    fn from(collection: IpCollection) -> Self {
        Self {
            len: collection.len(),
            iter: Box::new(collection.into_iter().map(|ip| ip.to_string())),
        }
    }
}

/// Produces the ordered, not yet validated entries of a source.
pub fn enumerate(source: &TargetSource) -> anyhow::Result<Entries> {
    let entries: Entries = match source {
        TargetSource::Ip(ip) => vec![ip.trim().to_string()].into(),
        TargetSource::File(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading target file {}", path.display()))?;
            let entries = entries_from_lines(&text);
            debug!("Found {} entries in {}", entries.len(), path.display());
            entries.into()
        }
        TargetSource::Subnet(subnet) => {
            let target = Target::from_str(subnet).map_err(|e| anyhow::anyhow!(e))?;
            to_collection(target).into()
        }
        TargetSource::Asn { asn, table } => {
            let table = AsnTable::load(table)?;
            let prefixes = table.prefixes_for(*asn);
            debug!("AS{asn} announces {} prefixes", prefixes.len());
            expand_prefixes(&prefixes).into()
        }
    };

    let len: usize = entries.len();
    let unit: &str = if len == 1 { "entry has been" } else { "entries have been" };
    success!("{len} {unit} parsed successfully");

    Ok(entries)
}

/// One entry per non-empty line.
pub fn entries_from_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// IPv4 prefixes are expanded address by address; IPv6 prefixes are too large
/// to walk and are skipped.
pub fn expand_prefixes(prefixes: &[IpNetwork]) -> IpCollection {
    let mut collection = IpCollection::new();
    for prefix in prefixes {
        match prefix {
            IpNetwork::V4(net) => {
                collection.add_range(Ipv4Range::new(net.network(), net.broadcast()));
            }
            IpNetwork::V6(net) => warn!("Skipping IPv6 prefix {net}"),
        }
    }
    collection
}

/// Validates an entry and binds it to the run's port and mode.
pub fn to_probe_target(seq: usize, entry: &str, port: u16, mode: ScanMode) -> Result<ProbeTarget, ProbeError> {
    let addr = entry
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ProbeError::InvalidInput(entry.to_string()))?;

    Ok(ProbeTarget {
        seq,
        addr,
        port,
        mode,
    })
}

/// Parses a comma-separated list of targets (e.g., "192.168.1.5, 10.0.0.1-50").
pub fn parse_commas(s: &str) -> anyhow::Result<Target> {
    let mut targets = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let target = Target::from_str(part)
            .map_err(|e| anyhow::anyhow!("Failed to parse target '{}': {}", part, e))?;

        targets.push(target);
    }

    Ok(Target::Multi { targets })
}

/// Parses a single IP address.
fn parse_host(s: &str) -> Option<Target> {
    s.parse::<IpAddr>()
        .ok()
        .map(|target_addr| Target::Host { target_addr })
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
fn parse_ip_range(s: &str) -> Result<Option<Target>, String> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = start_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("Invalid start IP in range '{start_str}': {e}"))?;

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;

    let ipv4_range = Ipv4Range::new(start_addr, end_addr);
    Ok(Some(Target::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(format!("End range cannot be empty: {original_s}"));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("Invalid end range '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("End range has too many octets: {end_str}"));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr_range(s: &str) -> Result<Option<Target>, String> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("Invalid IP in CIDR '{ip_str}': {e}"))?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| format!("Invalid prefix in CIDR '{prefix_str}': {e}"))?;

    let ipv4_range = range::cidr_range(ipv4_addr, prefix).map_err(|e| e.to_string())?;

    Ok(Some(Target::Range { ipv4_range }))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
