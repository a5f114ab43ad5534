//! Decoding of resource record data.

use crate::dns::decode_name;
use crate::errors::{ParseError, ResultExt};
use crate::io::ByteCursor;
use crate::types::{Resource, Type};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Reads `len` bytes of record data from `cur` and interprets them according
/// to `type`. The cursor always ends up exactly `len` bytes further on.
pub(crate) fn parse_resource(
    r#type: Type,
    cur: &mut ByteCursor<'_>,
    len: usize,
) -> Result<Resource, ParseError> {
    let f = match r#type {
        Type::A | Type::AAAA => parse_addrs,

        // https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.11
        Type::NS | Type::CNAME | Type::PTR => parse_name,

        _ => parse_other,
    };

    // Call the appropriate parser function.
    f(r#type, cur, len).with_context(|| format!("reading {} record data", r#type))
}

fn parse_addrs(r#type: Type, cur: &mut ByteCursor<'_>, len: usize) -> Result<Resource, ParseError> {
    let data = cur.next_bytes(len)?;

    let ips = parse_ip_addrs(r#type, data)?;
    Ok(match r#type {
        Type::A => Resource::A(ips.into_iter().filter_map(as_v4).collect()),
        _ => Resource::AAAA(ips.into_iter().filter_map(as_v6).collect()),
    })
}

fn parse_name(r#type: Type, cur: &mut ByteCursor<'_>, len: usize) -> Result<Resource, ParseError> {
    // The name may point anywhere earlier in the message, so decode it with a
    // cursor over the whole message rather than just the record data.
    let mut name_cur = *cur;
    let name = decode_name(&mut name_cur)?;

    let name_len = name_cur.offset() - cur.offset();
    if name_len != len {
        return Err(ParseError::NameLength {
            record_type: r#type,
            name_len,
            data_len: len,
        });
    }
    cur.next_bytes(len)?;

    Ok(match r#type {
        Type::NS => Resource::NS(name),
        Type::CNAME => Resource::CNAME(name),
        _ => Resource::PTR(name),
    })
}

fn parse_other(_type: Type, cur: &mut ByteCursor<'_>, len: usize) -> Result<Resource, ParseError> {
    Ok(Resource::Other(cur.next_bytes(len)?.to_vec()))
}

/// Parses the data of an A or AAAA record into one or more addresses.
///
/// The data must be a non-zero multiple of the address size (4 bytes for A,
/// 16 for AAAA). Anything else is rejected rather than truncated or padded.
pub fn parse_ip_addrs(r#type: Type, data: &[u8]) -> Result<Vec<IpAddr>, ParseError> {
    let size = match r#type {
        Type::A => 4,
        Type::AAAA => 16,
        _ => {
            return Err(ParseError::InvalidAddress {
                record_type: r#type,
                len: data.len(),
            })
        }
    };

    if data.is_empty() || data.len() % size != 0 {
        return Err(ParseError::InvalidAddress {
            record_type: r#type,
            len: data.len(),
        });
    }

    let mut ips = Vec::with_capacity(data.len() / size);
    for chunk in data.chunks_exact(size) {
        let ip = if size == 4 {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(chunk);
            IpAddr::V4(Ipv4Addr::from(octets))
        } else {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(chunk);
            IpAddr::V6(Ipv6Addr::from(octets))
        };
        ips.push(ip);
    }

    Ok(ips)
}

fn as_v4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

fn as_v6(ip: IpAddr) -> Option<Ipv6Addr> {
    match ip {
        IpAddr::V6(ip) => Some(ip),
        IpAddr::V4(_) => None,
    }
}
