use num_traits::FromPrimitive;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use strum_macros::{AsRefStr, Display, EnumString};

/// "Messages carried by UDP are restricted to 512 bytes (not counting the IP
/// or UDP headers)." See [rfc1035#section-4.2.1].
///
/// [rfc1035#section-4.2.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.1
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Size of the fixed header at the start of every message.
pub const HEADER_SIZE: usize = 12;

/// DNS Message, as received from a nameserver.
///
/// The four record sections always hold exactly as many entries as the
/// header's counts say; see [`Message::from_slice`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub header: Header,

    /// The questions.
    pub questions: Vec<Question>,

    /// The answer records.
    pub answers: Vec<Record>,

    /// The authoritative records.
    pub authorities: Vec<Record>,

    /// The additional records.
    pub additionals: Vec<Record>,
}

/// The Header section of a DNS message, as defined in [rfc1035#section-4.1.1].
///
/// The flags are kept as the raw 16 bits; use the accessors to pick them apart.
///
/// [rfc1035#section-4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// 16-bit identifier assigned by the program that generates any kind of
    /// query. This identifier is copied into the corresponding reply and can be
    /// used by the requester to match up replies to outstanding queries.
    pub id: u16,
    pub flags: u16,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl Header {
    /// Specifies whether this message is a query (false), or a response (true).
    pub fn is_response(&self) -> bool {
        self.flags & 0b1000_0000_0000_0000 != 0
    }

    /// Kind of query in this message, or None if the opcode is unassigned.
    pub fn opcode(&self) -> Option<Opcode> {
        FromPrimitive::from_u16((self.flags >> 11) & 0b1111)
    }

    /// Authoritative Answer - the responding name server is an authority for
    /// the domain name in the question section.
    pub fn is_authoritative(&self) -> bool {
        self.flags & 0b0000_0100_0000_0000 != 0
    }

    /// Truncation - this message was truncated.
    pub fn is_truncated(&self) -> bool {
        self.flags & 0b0000_0010_0000_0000 != 0
    }

    /// Recursion Desired.
    pub fn recursion_desired(&self) -> bool {
        self.flags & 0b0000_0001_0000_0000 != 0
    }

    /// Recursion Available.
    pub fn recursion_available(&self) -> bool {
        self.flags & 0b0000_0000_1000_0000 != 0
    }

    /// Response code, or None if the code is unassigned.
    pub fn rcode(&self) -> Option<Rcode> {
        FromPrimitive::from_u16(self.flags & 0b1111)
    }
}

/// DNS Question.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Question {
    /// The domain name, as dotted labels without a trailing dot.
    pub name: String,
    pub r#type: Type,
    pub class: Class,
}

/// Resource Record (RR)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,

    pub r#type: Type,
    pub class: Class,

    /// The number of seconds that the resource record may be cached
    /// before the source of the information should again be consulted.
    /// Zero is interpreted to mean that the RR can only be used for the
    /// transaction in progress.
    pub ttl: Duration,

    pub resource: Resource,
}

impl Record {
    /// Returns the addresses held by an A or AAAA record.
    pub fn ip_addrs(&self) -> Vec<IpAddr> {
        match &self.resource {
            Resource::A(ips) => ips.iter().map(|ip| IpAddr::V4(*ip)).collect(),
            Resource::AAAA(ips) => ips.iter().map(|ip| IpAddr::V6(*ip)).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the domain name held by a NS, CNAME or PTR record.
    pub fn target(&self) -> Option<&str> {
        match &self.resource {
            Resource::NS(name) | Resource::CNAME(name) | Resource::PTR(name) => Some(name),
            _ => None,
        }
    }
}

/// The data of a resource record, interpreted according to the record's type.
///
// When adding a variant, a parsing function must be added in resource.rs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Resource {
    /// One or more IPv4 addresses. Nameservers send one per record, but a
    /// multiple of four bytes is accepted.
    A(Vec<Ipv4Addr>),
    AAAA(Vec<Ipv6Addr>),

    NS(String),
    CNAME(String),
    PTR(String),

    /// The raw data of any other record type.
    Other(Vec<u8>),
}

/// A DNS query: a header plus exactly one question. This is the only kind of
/// message this crate sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub header: Header,
    pub question: Question,
}

impl Query {
    /// Creates a query for `domain` with a random id.
    pub fn new(domain: &str, r#type: Type) -> Query {
        Query::with_id(domain, r#type, rand::random())
    }

    /// Creates a query for `domain` with the given id.
    pub fn with_id(domain: &str, r#type: Type, id: u16) -> Query {
        Query {
            header: Header {
                id,
                question_count: 1,
                ..Default::default()
            },
            question: Question {
                name: domain.to_string(),
                r#type,
                class: Class::Internet,
            },
        }
    }
}

/// Specifies kind of query in this message. See [rfc1035], [rfc6895] and <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-5>
///
/// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
/// [rfc6895]: https://datatracker.ietf.org/doc/html/rfc6895
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u8)] // Really only 4 bits
pub enum Opcode {
    Query = 0,

    /// Inverse Query (OBSOLETE). See [rfc3425].
    ///
    /// [rfc3425]: https://datatracker.ietf.org/doc/html/rfc3425
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,

    /// DNS Stateful Operations (DSO). See [rfc8490]
    ///
    /// [rfc8490]: https://datatracker.ietf.org/doc/html/rfc8490
    DSO = 6,
}

/// Response Codes.
/// See [rfc1035] and <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-6>
///
/// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u8)]
pub enum Rcode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NXDomain = 3,
    NotImp = 4,
    Refused = 5,
    YXDomain = 6,
    YXRRSet = 7,
    NXRRSet = 8,
    NotAuth = 9,
    NotZone = 10,
    DSOTYPENI = 11,
}

/// Resource Record Type, for example, A, CNAME or SOA.
///
/// Types this crate has no use for are carried as `Unknown` so a response
/// containing them still decodes.
#[derive(Copy, Clone, Debug, AsRefStr, EnumString, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Type {
    /// (Default) IPv4 Address.
    A,
    NS,
    CNAME,
    SOA,

    /// Domain name pointer.
    PTR,

    /// Mail exchange.
    MX,

    /// Text strings.
    TXT,

    /// IPv6 Address.
    AAAA,

    /// Server Selection
    SRV,

    /// EDNS(0) Opt type.
    OPT,

    /// Any record type. Only valid as a Question Type.
    ANY,

    #[strum(disabled)]
    Unknown(u16),
}

impl Default for Type {
    fn default() -> Self {
        Type::A
    }
}

impl From<u16> for Type {
    fn from(code: u16) -> Self {
        match code {
            1 => Type::A,
            2 => Type::NS,
            5 => Type::CNAME,
            6 => Type::SOA,
            12 => Type::PTR,
            15 => Type::MX,
            16 => Type::TXT,
            28 => Type::AAAA,
            33 => Type::SRV,
            41 => Type::OPT,
            255 => Type::ANY,
            code => Type::Unknown(code),
        }
    }
}

impl From<Type> for u16 {
    fn from(r#type: Type) -> Self {
        match r#type {
            Type::A => 1,
            Type::NS => 2,
            Type::CNAME => 5,
            Type::SOA => 6,
            Type::PTR => 12,
            Type::MX => 15,
            Type::TXT => 16,
            Type::AAAA => 28,
            Type::SRV => 33,
            Type::OPT => 41,
            Type::ANY => 255,
            Type::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The generic form from rfc3597.
            Type::Unknown(code) => write!(f, "TYPE{}", code),
            t => f.pad(t.as_ref()),
        }
    }
}

/// Resource Record Class. Only the Internet class is ever queried.
#[derive(Copy, Clone, Debug, AsRefStr, EnumString, PartialEq, Eq, Hash)]
pub enum Class {
    /// (Default) The Internet (IN), see [rfc1035].
    ///
    /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
    #[strum(serialize = "IN")]
    Internet,

    /// Chaosnet (CH).
    #[strum(serialize = "CH")]
    Chaos,

    /// Hesiod (HS).
    #[strum(serialize = "HS")]
    Hesiod,

    #[strum(serialize = "*")]
    Any,

    #[strum(disabled)]
    Unknown(u16),
}

impl Default for Class {
    fn default() -> Self {
        Class::Internet
    }
}

impl From<u16> for Class {
    fn from(code: u16) -> Self {
        match code {
            1 => Class::Internet,
            3 => Class::Chaos,
            4 => Class::Hesiod,
            255 => Class::Any,
            code => Class::Unknown(code),
        }
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        match class {
            Class::Internet => 1,
            Class::Chaos => 3,
            Class::Hesiod => 4,
            Class::Any => 255,
            Class::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Unknown(code) => write!(f, "CLASS{}", code),
            c => f.pad(c.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_type_codes() {
        for code in [1u16, 2, 5, 6, 12, 15, 16, 28, 33, 41, 255, 46, 0].iter() {
            assert_eq!(u16::from(Type::from(*code)), *code);
        }
        assert_eq!(Type::from(28), Type::AAAA);
        assert_eq!(Type::from(46), Type::Unknown(46));
        assert_eq!(Type::from_str("CNAME"), Ok(Type::CNAME));
        assert_eq!(Type::AAAA.to_string(), "AAAA");
        assert_eq!(Type::Unknown(46).to_string(), "TYPE46");
    }

    #[test]
    fn test_class_codes() {
        assert_eq!(Class::from(1), Class::Internet);
        assert_eq!(u16::from(Class::Internet), 1);
        assert_eq!(Class::from(512), Class::Unknown(512));
        assert_eq!(Class::Internet.to_string(), "IN");
        assert_eq!(Class::Unknown(512).to_string(), "CLASS512");
    }

    #[test]
    fn test_header_flags() {
        let header = Header {
            flags: 33152, // 0x8180: response, recursion desired and available.
            ..Default::default()
        };
        assert!(header.is_response());
        assert!(header.recursion_desired());
        assert!(header.recursion_available());
        assert!(!header.is_authoritative());
        assert!(!header.is_truncated());
        assert_eq!(header.opcode(), Some(Opcode::Query));
        assert_eq!(header.rcode(), Some(Rcode::NoError));

        let header = Header {
            flags: 0x8403, // Authoritative NXDOMAIN.
            ..Default::default()
        };
        assert!(header.is_authoritative());
        assert_eq!(header.rcode(), Some(Rcode::NXDomain));
    }

    #[test]
    fn test_new_query() {
        let query = Query::with_id("google.com", Type::A, 1);
        assert_eq!(query.header.id, 1);
        assert_eq!(query.header.question_count, 1);
        assert_eq!(query.header.flags, 0);
        assert_eq!(query.question.name, "google.com");
        assert_eq!(query.question.class, Class::Internet);
    }
}
