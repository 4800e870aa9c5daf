//! Autonomous-system prefix table.
//!
//! Reads the plain-text `ipasn.dat` format: one `<prefix>\t<asn>` pair per
//! line, with `;` starting a comment line.

use std::path::Path;

use anyhow::Context;
use pnet::ipnetwork::IpNetwork;
use tracing::debug;

#[derive(Debug, Default)]
pub struct AsnTable {
    prefixes: Vec<(IpNetwork, u32)>,
}

impl AsnTable {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading ASN table {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut prefixes = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            match parse_line(line) {
                Some(entry) => prefixes.push(entry),
                None => debug!("Skipping malformed ASN table line {}: {line}", line_no + 1),
            }
        }

        Self { prefixes }
    }

    /// Prefixes announced by `asn`, in table order.
    pub fn prefixes_for(&self, asn: u32) -> Vec<IpNetwork> {
        self.prefixes
            .iter()
            .filter(|(_, owner)| *owner == asn)
            .map(|(net, _)| *net)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(IpNetwork, u32)> {
    let mut fields = line.split_whitespace();
    let prefix = fields.next()?.parse::<IpNetwork>().ok()?;
    let asn = fields.next()?.parse::<u32>().ok()?;
    Some((prefix, asn))
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

    const TABLE: &str = "; IP-ASN32-DAT file\n\
                         ; Original source:\trib.20240101.0000.bz2\n\
                         1.0.0.0/24\t13335\n\
                         1.0.4.0/22\t38803\n\
                         not-a-prefix\t1\n\
                         1.1.1.0/24\t13335\n\
                         2001:db8::/32\t13335\n";

    #[test]
    fn prefixes_are_returned_in_table_order() {
        let table = AsnTable::parse(TABLE);
        let prefixes: Vec<String> = table.prefixes_for(13335).iter().map(|p| p.to_string()).collect();

        assert_eq!(prefixes, ["1.0.0.0/24", "1.1.1.0/24", "2001:db8::/32"]);
    }

    #[test]
    fn malformed_lines_and_comments_are_skipped() {
        let table = AsnTable::parse(TABLE);
        assert_eq!(table.len(), 4);
        assert!(table.prefixes_for(1).is_empty());
    }
}
