use crate::clients::{Context, Exchanger, UdpClient};
use crate::errors::Error;
use crate::types::*;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// The IPv4 addresses of the authoritative root nameservers, a through m.
///
/// See <https://www.iana.org/domains/root/servers>
pub const ROOT_SERVERS: [IpAddr; 13] = [
    IpAddr::V4(Ipv4Addr::new(198, 41, 0, 4)),     // a.root-servers.net Verisign, Inc.
    IpAddr::V4(Ipv4Addr::new(199, 9, 14, 201)),   // b.root-servers.net USC-ISI
    IpAddr::V4(Ipv4Addr::new(192, 33, 4, 12)),    // c.root-servers.net Cogent Communications
    IpAddr::V4(Ipv4Addr::new(199, 7, 91, 13)),    // d.root-servers.net University of Maryland
    IpAddr::V4(Ipv4Addr::new(192, 203, 230, 10)), // e.root-servers.net NASA (Ames Research Center)
    IpAddr::V4(Ipv4Addr::new(192, 5, 5, 241)),    // f.root-servers.net Internet Systems Consortium, Inc.
    IpAddr::V4(Ipv4Addr::new(192, 112, 36, 4)),   // g.root-servers.net US Department of Defense (NIC)
    IpAddr::V4(Ipv4Addr::new(198, 97, 190, 53)),  // h.root-servers.net US Army (Research Lab)
    IpAddr::V4(Ipv4Addr::new(192, 36, 148, 17)),  // i.root-servers.net Netnod
    IpAddr::V4(Ipv4Addr::new(192, 58, 128, 30)),  // j.root-servers.net Verisign, Inc.
    IpAddr::V4(Ipv4Addr::new(193, 0, 14, 129)),   // k.root-servers.net RIPE NCC
    IpAddr::V4(Ipv4Addr::new(199, 7, 83, 42)),    // l.root-servers.net ICANN
    IpAddr::V4(Ipv4Addr::new(202, 12, 27, 33)),   // m.root-servers.net WIDE Project
];

/// Configures a [`Resolver`].
///
/// ```rust
/// use rootwalk::clients::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     query_timeout: Duration::from_secs(2),
///     seed: Some(42),
///     ..Default::default()
/// };
/// assert_eq!(config.port, 53);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Where every lookup starts. An empty list means [`ROOT_SERVERS`].
    pub root_servers: Vec<IpAddr>,

    /// The port nameservers listen on.
    pub port: u16,

    /// How long to wait for each individual nameserver to reply.
    pub query_timeout: Duration,

    /// The most nameserver queries a single lookup may make, counting those
    /// made to find the address of a nameserver.
    pub max_depth: usize,

    /// Seeds the random choices (query ids, which glue, NS or CNAME record to
    /// follow) made by each lookup. Lookups are entropy seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root_servers: ROOT_SERVERS.to_vec(),
            port: 53,
            query_timeout: Duration::new(5, 0),
            max_depth: 24,
            seed: None,
        }
    }
}

/// An iterative resolver. It starts every lookup at a root nameserver and
/// follows the referrals it is given until it finds an address.
///
/// A `Resolver` may be shared between threads; each [`Resolver::lookup_ip`]
/// call keeps its own state, apart from the round-robin choice of root
/// server.
///
/// # Example
///
/// ```rust,no_run
/// use rootwalk::clients::{Context, Resolver};
/// use std::time::Duration;
///
/// let resolver = Resolver::new();
/// let ctx = Context::with_timeout(Duration::from_secs(30));
/// let ips = resolver.lookup_ip(&ctx, "www.example.com").expect("lookup failed");
///
/// println!("{:?}", ips);
/// ```
///
/// See [rfc1034#section-5.3.3].
///
/// [rfc1034#section-5.3.3]: https://datatracker.ietf.org/doc/html/rfc1034#section-5.3.3
#[derive(Debug)]
pub struct Resolver<E = UdpClient> {
    config: Config,
    client: E,

    // Index into config.root_servers, used for round-robin choice.
    next_root: AtomicUsize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Creates a new Resolver that talks UDP to the default root servers.
    pub fn new() -> Resolver<UdpClient> {
        Resolver::new_with_client(UdpClient::default())
    }
}

/// State of one `lookup_ip` call.
struct Walk {
    depth: usize,
    rng: StdRng,
}

impl<E> Resolver<E>
where
    E: Exchanger,
{
    /// Creates a new Resolver with the default configuration, that exchanges
    /// messages with `client`.
    pub fn new_with_client(client: E) -> Resolver<E> {
        Resolver::with_config(Config::default(), client)
    }

    pub fn with_config(mut config: Config, client: E) -> Resolver<E> {
        if config.root_servers.is_empty() {
            config.root_servers = ROOT_SERVERS.to_vec();
        }

        Resolver {
            config,
            client,
            next_root: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves a name into one or more IP addresses, starting at a root
    /// nameserver.
    ///
    /// Only A queries are sent, but AAAA records found in an answer are
    /// returned as well. The lookup gives up when `ctx` is cancelled or
    /// expires, or after [`Config::max_depth`] queries.
    ///
    /// See [rfc1035#section-7] and [rfc1034#section-5].
    ///
    /// [rfc1035#section-7]: https://datatracker.ietf.org/doc/html/rfc1035#section-7
    /// [rfc1034#section-5]: https://datatracker.ietf.org/doc/html/rfc1034#section-5
    pub fn lookup_ip(&self, ctx: &Context, domain: &str) -> Result<Vec<IpAddr>, Error> {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut walk = Walk { depth: 0, rng };

        let root = self.choose_root_server();
        self.resolve(ctx, &mut walk, domain, root)
    }

    /// Chooses a root nameserver in round-robin fashion.
    fn choose_root_server(&self) -> IpAddr {
        let roots = &self.config.root_servers;
        let idx = self.next_root.fetch_add(1, Ordering::Relaxed);
        roots[idx % roots.len()]
    }

    fn resolve(
        &self,
        ctx: &Context,
        walk: &mut Walk,
        domain: &str,
        nameserver: IpAddr,
    ) -> Result<Vec<IpAddr>, Error> {
        let mut domain = domain.to_string();
        let mut nameserver = nameserver;

        loop {
            let m = self.query(ctx, walk, &domain, nameserver)?;
            let depth = walk.depth;

            log_records("answer", &m.answers, depth);
            log_records("authority", &m.authorities, depth);
            log_records("additional", &m.additionals, depth);

            // Successfully resolved an address, we're done.
            let ips = answer_addrs(&m);
            if !ips.is_empty() {
                debug!("[{}] resolved {} to {:?}", depth, domain, ips);
                return Ok(ips);
            }

            // Resolve again with a nameserver whose address came with the
            // referral.
            let glue = glue_addrs(&m);
            if let Some(addr) = glue.choose(&mut walk.rng) {
                debug!(
                    "[{}] resolving {} with new nameserver {} (one of {})",
                    depth,
                    domain,
                    addr,
                    glue.len()
                );
                nameserver = *addr;
                continue;
            }

            // First resolve the nameserver's name to an address, then carry
            // on with that address.
            let ns_names = targets(&m.authorities, Type::NS);
            if let Some(ns) = ns_names.choose(&mut walk.rng) {
                debug!(
                    "[{}] resolving nameserver {} (one of {}) for {}",
                    depth,
                    ns,
                    ns_names.len(),
                    domain
                );

                let root = self.choose_root_server();
                let addrs = match self.resolve(ctx, walk, ns, root) {
                    Ok(addrs) => addrs,
                    // These apply to the whole lookup, not just this nameserver.
                    Err(e @ Error::Cancelled)
                    | Err(e @ Error::DeadlineExceeded)
                    | Err(e @ Error::DepthExceeded { .. }) => return Err(e),
                    Err(e) => {
                        return Err(Error::NameServer {
                            nameserver: ns.to_string(),
                            source: Box::new(e),
                        })
                    }
                };

                let routable = addrs.iter().find(|addr| {
                    let ok = is_routable(addr);
                    if !ok {
                        debug!("[{}] skipping private nameserver {} ({})", depth, addr, ns);
                    }
                    ok
                });
                if let Some(addr) = routable {
                    debug!(
                        "[{}] resolving {} with new nameserver {} ({})",
                        walk.depth, domain, addr, ns
                    );
                    nameserver = *addr;
                    continue;
                }
            }

            let cnames = targets(&m.answers, Type::CNAME);
            if let Some(cname) = cnames.choose(&mut walk.rng) {
                debug!(
                    "[{}] following CNAME {} -> {} (one of {})",
                    depth,
                    domain,
                    cname,
                    cnames.len()
                );
                domain = cname.to_string();
                continue;
            }

            debug!("[{}] no IP addresses found for {}:\n{}", depth, domain, m);
            return Err(Error::Unresolved {
                domain,
                message: Box::new(m),
            });
        }
    }

    /// Sends a single A query, counting it against the depth limit.
    fn query(
        &self,
        ctx: &Context,
        walk: &mut Walk,
        domain: &str,
        nameserver: IpAddr,
    ) -> Result<Message, Error> {
        ctx.check()?;

        if walk.depth >= self.config.max_depth {
            return Err(Error::DepthExceeded {
                domain: domain.to_string(),
                max: self.config.max_depth,
            });
        }
        walk.depth += 1;

        let server = SocketAddr::new(nameserver, self.config.port);
        let query = Query::with_id(domain, Type::A, walk.rng.gen());

        debug!(
            "[{}] sending {} query for {} to {} (id {})",
            walk.depth, query.question.r#type, domain, server, query.header.id
        );

        let ctx = ctx.child_with_timeout(self.config.query_timeout);
        self.client.exchange(&ctx, server, &query)
    }
}

/// Returns all the addresses in the answer section.
fn answer_addrs(m: &Message) -> Vec<IpAddr> {
    m.answers.iter().flat_map(Record::ip_addrs).collect()
}

/// Returns the addresses in the additional section that belong to one of
/// the nameservers named in the authority section. IPv4 addresses are
/// preferred.
fn glue_addrs(m: &Message) -> Vec<IpAddr> {
    let ns_names = targets(&m.authorities, Type::NS);

    let glue: Vec<IpAddr> = m
        .additionals
        .iter()
        .filter(|r| ns_names.iter().any(|ns| ns.eq_ignore_ascii_case(&r.name)))
        .flat_map(Record::ip_addrs)
        .collect();

    if glue.iter().any(IpAddr::is_ipv4) {
        glue.into_iter().filter(IpAddr::is_ipv4).collect()
    } else {
        glue
    }
}

/// Returns the names held by the records of the given type.
fn targets(records: &[Record], r#type: Type) -> Vec<&str> {
    records
        .iter()
        .filter(|r| r.r#type == r#type)
        .filter_map(Record::target)
        .collect()
}

/// Returns false for addresses a public nameserver can't have, such as
/// private, loopback or link-local ones.
pub(crate) fn is_routable(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => {
            !(ip.is_private()
                || ip.is_loopback()
                || ip.is_link_local()
                || ip.is_unspecified()
                || ip.is_broadcast())
        }
        IpAddr::V6(ip) => !(ip.is_loopback() || ip.is_unspecified() || is_local_v6(ip)),
    }
}

/// Unique local (fc00::/7) or link-local (fe80::/10).
fn is_local_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

fn log_records(section: &str, records: &[Record], depth: usize) {
    for r in records {
        debug!(
            "[{}] {} record: {} {} {}",
            depth, section, r.name, r.r#type, r.resource
        );
    }
}
