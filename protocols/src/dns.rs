use std::net::Ipv4Addr;

use anyhow::{Context, bail, ensure};
use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{
    DnsClass, DnsQuery, DnsType, DnsTypes, MutableDnsPacket, Opcode, Retcode,
};

use netmgmt_common::utils::ip;

pub const DNS_HDR_LEN: usize = 12;

const TXT_TYPE: DnsType = DnsType(16);

/// Records extracted from one DNS reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub id: u16,
    pub records: Vec<String>,
}

pub fn create_ptr_packet(ip_addr: &Ipv4Addr, id: u16) -> anyhow::Result<Vec<u8>> {
    let ptr_string: String = ip::reverse_address_to_ptr(ip_addr);
    create_query_packet(&ptr_string, DnsTypes::PTR, id)
}

pub fn create_txt_packet(name: &str, id: u16) -> anyhow::Result<Vec<u8>> {
    create_query_packet(name, TXT_TYPE, id)
}

/// Host names of the PTR records in a reply. A name error yields no records.
pub fn get_hostnames(payload: &[u8]) -> anyhow::Result<DnsAnswer> {
    parse_answer(payload, |data| match data {
        RData::PTR(ptr) => Some(ptr.0.to_string()),
        _ => None,
    })
}

/// Strings of the TXT records in a reply, one entry per record.
pub fn get_txt(payload: &[u8]) -> anyhow::Result<DnsAnswer> {
    parse_answer(payload, |data| match data {
        RData::TXT(txt) => Some(
            txt.iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect::<String>(),
        ),
        _ => None,
    })
}

fn parse_answer<F>(payload: &[u8], extract: F) -> anyhow::Result<DnsAnswer>
where
    F: Fn(&RData) -> Option<String>,
{
    let packet = Packet::parse(payload).context("failed to parse DNS packet")?;
    ensure!(!packet.header.query, "DNS packet is a query, not a reply");

    let id: u16 = packet.header.id;
    match packet.header.response_code {
        ResponseCode::NoError => {}
        ResponseCode::NameError => {
            return Ok(DnsAnswer {
                id,
                records: Vec::new(),
            });
        }
        code => bail!("DNS server answered with {code:?}"),
    }

    let records: Vec<String> = packet
        .answers
        .iter()
        .filter_map(|answer| extract(&answer.data))
        .collect();

    Ok(DnsAnswer { id, records })
}

fn create_query_packet(name: &str, qtype: DnsType, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = DnsQuery {
        qname: encode_dns_name(name),
        qtype,
        qclass: DnsClass(1),
        payload: Vec::new(),
    };
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

    // Question section goes in by hand
    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&query.qtype.0.to_be_bytes());
    cursor += 2;

    buffer[cursor..cursor + 2].copy_from_slice(&query.qclass.0.to_be_bytes());

    Ok(buffer)
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
