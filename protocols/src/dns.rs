use anyhow::{Context, bail};
use dns_parser::{Packet, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsQuery, DnsTypes, MutableDnsPacket, Opcode, Retcode};

pub const DNS_HDR_LEN: usize = 12;

/// Name resolved by the amplification check. Any public name works as long as
/// an open resolver will recurse for it.
pub const PROBE_NAME: &str = "www.google.com";

/// Response code of a DNS reply, reduced to what the amplification check needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    ServerFailure,
    Refused,
    Other(u8),
}

impl From<ResponseCode> for Rcode {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::NoError => Rcode::NoError,
            ResponseCode::ServerFailure => Rcode::ServerFailure,
            ResponseCode::Refused => Rcode::Refused,
            ResponseCode::FormatError => Rcode::Other(1),
            ResponseCode::NameError => Rcode::Other(3),
            ResponseCode::NotImplemented => Rcode::Other(4),
            ResponseCode::Reserved(code) => Rcode::Other(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsReply {
    pub id: u16,
    pub rcode: Rcode,
    pub recursion_available: bool,
    pub answers: usize,
}

impl DnsReply {
    /// The server recursed for us: it answers queries for anyone.
    pub fn resolved(&self) -> bool {
        self.rcode == Rcode::NoError && self.answers > 0
    }
}

/// Builds a recursive `A` query for `name`.
pub fn create_query_packet(name: &str, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = create_a_query(name);
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let total: usize = DNS_HDR_LEN + qlen;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&query.qtype.0.to_be_bytes());
    cursor += 2;

    buffer[cursor..cursor + 2].copy_from_slice(&query.qclass.0.to_be_bytes());

    Ok(buffer)
}

/// Parses a reply to the query carrying `expected_id`.
pub fn parse_reply(payload: &[u8], expected_id: u16) -> anyhow::Result<DnsReply> {
    let packet = Packet::parse(payload).context("failed to parse DNS reply")?;

    if packet.header.query {
        bail!("packet is a query, not a reply");
    }
    if packet.header.id != expected_id {
        bail!(
            "transaction id mismatch: sent {expected_id:#06x}, got {:#06x}",
            packet.header.id
        );
    }

    Ok(DnsReply {
        id: packet.header.id,
        rcode: packet.header.response_code.into(),
        recursion_available: packet.header.recursion_available,
        answers: packet.answers.len(),
    })
}

fn create_a_query(name: &str) -> DnsQuery {
    DnsQuery {
        qname: encode_dns_name(name),
        qtype: DnsTypes::A,
        qclass: DnsClass(1),
        payload: Vec::new(),
    }
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
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

    /// Turns a query into a reply with the given rcode and one A record per
    /// address.
    fn reply_to(query: &[u8], rcode: u8, addrs: &[[u8; 4]]) -> Vec<u8> {
        let mut reply = query.to_vec();
        reply[2] |= 0x80;
        reply[3] = 0x80 | rcode;
        reply[6..8].copy_from_slice(&(addrs.len() as u16).to_be_bytes());
        for addr in addrs {
            reply.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
            reply.extend_from_slice(&300u32.to_be_bytes());
            reply.extend_from_slice(&[0x00, 0x04]);
            reply.extend_from_slice(addr);
        }
        reply
    }

    #[test]
    fn query_asks_for_recursion() {
        let query = create_query_packet(PROBE_NAME, 0xbeef).unwrap();
        let packet = Packet::parse(&query).unwrap();

        assert_eq!(packet.header.id, 0xbeef);
        assert!(packet.header.query);
        assert!(packet.header.recursion_desired);
        assert_eq!(packet.questions.len(), 1);
        assert_eq!(packet.questions[0].qname.to_string(), PROBE_NAME);
    }

    #[test]
    fn answered_query_counts_as_resolved() {
        let query = create_query_packet(PROBE_NAME, 7).unwrap();
        let reply = parse_reply(&reply_to(&query, 0, &[[142, 250, 1, 1]]), 7).unwrap();

        assert!(reply.resolved());
        assert!(reply.recursion_available);
        assert_eq!(reply.answers, 1);
    }

    #[test]
    fn refusal_and_empty_answers_are_not_resolved() {
        let query = create_query_packet(PROBE_NAME, 9).unwrap();

        let refused = parse_reply(&reply_to(&query, 5, &[]), 9).unwrap();
        assert_eq!(refused.rcode, Rcode::Refused);
        assert!(!refused.resolved());

        let empty = parse_reply(&reply_to(&query, 0, &[]), 9).unwrap();
        assert!(!empty.resolved());

        let servfail = parse_reply(&reply_to(&query, 2, &[]), 9).unwrap();
        assert_eq!(servfail.rcode, Rcode::ServerFailure);
    }

    #[test]
    fn rejects_foreign_or_garbled_packets() {
        let query = create_query_packet(PROBE_NAME, 1).unwrap();

        assert!(parse_reply(&query, 1).is_err());
        assert!(parse_reply(&reply_to(&query, 0, &[[1, 2, 3, 4]]), 2).is_err());
        assert!(parse_reply(&[0xde, 0xad], 1).is_err());
    }
}
