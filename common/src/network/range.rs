use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn to_iter(self) -> impl Iterator<Item = IpAddr> + Send {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(|ip| IpAddr::V4(Ipv4Addr::from(ip)))
    }

    pub fn len(&self) -> usize {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        end.checked_sub(start).map_or(0, |span| span as usize + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered set of addresses built from hosts and ranges.
///
/// Iteration yields singles and ranges in the order they were added, so the
/// status list of a run follows the input.
#[derive(Debug, Clone, Default)]
pub struct IpCollection {
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
enum Part {
    Single(IpAddr),
    Range(Ipv4Range),
}

impl IpCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_single(&mut self, addr: IpAddr) {
        self.parts.push(Part::Single(addr));
    }

    pub fn add_range(&mut self, range: Ipv4Range) {
        self.parts.push(Part::Range(range));
    }

    pub fn len(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Single(_) => 1,
                Part::Range(range) => range.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

}

impl Part {
    fn into_addrs(self) -> Box<dyn Iterator<Item = IpAddr> + Send> {
        match self {
            Part::Single(addr) => Box::new(std::iter::once(addr)),
            Part::Range(range) => Box::new(range.to_iter()),
        }
    }
}

/// Consumes the collection, expanding ranges only as addresses are pulled.
impl IntoIterator for IpCollection {
    type Item = IpAddr;
    type IntoIter = Box<dyn Iterator<Item = IpAddr> + Send>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.parts.into_iter().flat_map(Part::into_addrs))
    }
}

/// Every address of the network, network and broadcast addresses included.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Ipv4Range> {
    let network = pnet::ipnetwork::Ipv4Network::new(ip, prefix)?;
    let start = network.network();
    let end = network.broadcast();

    Ok(Ipv4Range::new(start, end))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
