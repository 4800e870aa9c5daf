pub mod run;

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use lift_common::models::ScanMode;
use lift_common::network::target::TargetSource;

#[derive(Parser, Debug)]
#[command(name = "lift")]
#[command(about = "Low-impact identification of embedded devices.")]
#[command(group(ArgGroup::new("source").required(true).args(["ip", "file", "subnet", "asn"])))]
pub struct CommandLine {
    /// Single IP address to probe
    #[arg(short, long)]
    pub ip: Option<String>,

    /// File with one IP address per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// CIDR block, IPv4 range or comma-separated list of those
    #[arg(short, long)]
    pub subnet: Option<String>,

    /// Autonomous system number to expand through the ASN table
    #[arg(short, long)]
    pub asn: Option<u32>,

    /// Port to fingerprint
    #[arg(short, long, default_value_t = 443)]
    pub port: u16,

    /// Test DNS, SSDP and NTP reflection instead of fingerprinting
    #[arg(short, long)]
    pub recurse: bool,

    /// Fingerprint and test reflection
    #[arg(short = 'R', long)]
    pub recon: bool,

    /// Report unidentified services and every fall-through reason
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of targets probed at the same time
    #[arg(short, long, default_value_t = 32)]
    pub workers: usize,

    /// Directory holding the signature JSON files
    #[arg(long, default_value = "cert_collection")]
    pub signatures: PathBuf,

    /// Prefix-to-ASN table used by --asn
    #[arg(long, default_value = "ipasn.dat")]
    pub asn_db: PathBuf,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn mode(&self) -> ScanMode {
        ScanMode::from_flags(self.recurse, self.recon)
    }

    /// The one target source clap let through.
    pub fn source(&self) -> Option<TargetSource> {
        if let Some(ip) = &self.ip {
            return Some(TargetSource::Ip(ip.clone()));
        }
        if let Some(path) = &self.file {
            return Some(TargetSource::File(path.clone()));
        }
        if let Some(subnet) = &self.subnet {
            return Some(TargetSource::Subnet(subnet.clone()));
        }
        self.asn.map(|asn| TargetSource::Asn {
            asn,
            table: self.asn_db.clone(),
        })
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
