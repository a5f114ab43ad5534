use pretty_assertions::assert_eq;
use rootwalk::clients::{Config, Context, Exchanger, Resolver};
use rootwalk::types::*;
use rootwalk::Error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const ROOT: &str = "198.41.0.4";
const COM: &str = "192.5.6.30";
const EXAMPLE: &str = "199.43.135.53";

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// Answers queries from a script keyed by nameserver and domain, and
/// remembers every query it was sent.
#[derive(Default)]
struct MockExchanger {
    responses: HashMap<(IpAddr, String), Message>,
    queries: RefCell<Vec<(IpAddr, String)>>,
}

impl MockExchanger {
    fn on(mut self, server: &str, domain: &str, m: Message) -> Self {
        self.responses.insert((ip(server), domain.to_string()), m);
        self
    }

    fn queries(&self) -> Vec<(String, String)> {
        self.queries
            .borrow()
            .iter()
            .map(|(server, domain)| (server.to_string(), domain.clone()))
            .collect()
    }
}

impl Exchanger for MockExchanger {
    fn exchange(&self, ctx: &Context, server: SocketAddr, query: &Query) -> Result<Message, Error> {
        ctx.check()?;
        assert_eq!(server.port(), 53);

        let domain = query.question.name.clone();
        self.queries.borrow_mut().push((server.ip(), domain.clone()));

        match self.responses.get(&(server.ip(), domain)) {
            Some(m) => {
                let mut m = m.clone();
                m.header.id = query.header.id;
                m.questions = vec![query.question.clone()];
                Ok(m)
            }
            None => Err(Error::Timeout { server }),
        }
    }
}

fn record(name: &str, resource: Resource) -> Record {
    let r#type = match resource {
        Resource::A(_) => Type::A,
        Resource::AAAA(_) => Type::AAAA,
        Resource::NS(_) => Type::NS,
        Resource::CNAME(_) => Type::CNAME,
        Resource::PTR(_) => Type::PTR,
        Resource::Other(_) => Type::SOA,
    };
    Record {
        name: name.to_string(),
        r#type,
        class: Class::Internet,
        ttl: Duration::from_secs(300),
        resource,
    }
}

fn a(name: &str, addr: &str) -> Record {
    match ip(addr) {
        IpAddr::V4(ip) => record(name, Resource::A(vec![ip])),
        IpAddr::V6(ip) => record(name, Resource::AAAA(vec![ip])),
    }
}

fn answer(records: Vec<Record>) -> Message {
    Message {
        answers: records,
        ..Default::default()
    }
}

/// A referral to the nameservers of `zone`, with glue for those that have
/// an address.
fn referral(zone: &str, nameservers: &[(&str, Option<&str>)]) -> Message {
    let mut m = Message::default();
    for (ns, glue) in nameservers {
        m.authorities.push(record(zone, Resource::NS(ns.to_string())));
        if let Some(addr) = glue {
            m.additionals.push(a(ns, addr));
        }
    }
    m
}

fn config(roots: &[&str]) -> Config {
    Config {
        root_servers: roots.iter().map(|r| ip(r)).collect(),
        seed: Some(1),
        ..Default::default()
    }
}

fn q(server: &str, domain: &str) -> (String, String) {
    (server.to_string(), domain.to_string())
}

#[test_env_log::test]
fn test_direct_answer() {
    let mock = MockExchanger::default().on(
        ROOT,
        "example.com",
        answer(vec![
            a("example.com", "93.184.216.34"),
            a("example.com", "2606:2800:220:1:248:1893:25c8:1946"),
        ]),
    );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let ips = resolver
        .lookup_ip(&Context::background(), "example.com")
        .expect("lookup failed");

    assert_eq!(
        ips,
        vec![ip("93.184.216.34"), ip("2606:2800:220:1:248:1893:25c8:1946")]
    );
    assert_eq!(mock.queries(), vec![q(ROOT, "example.com")]);
}

#[test_env_log::test]
fn test_follows_glue() {
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "www.example.com",
            referral("com", &[("a.gtld-servers.net", Some(COM))]),
        )
        .on(
            COM,
            "www.example.com",
            referral("example.com", &[("a.iana-servers.net", Some(EXAMPLE))]),
        )
        .on(
            EXAMPLE,
            "www.example.com",
            answer(vec![a("www.example.com", "93.184.216.34")]),
        );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let ips = resolver
        .lookup_ip(&Context::background(), "www.example.com")
        .expect("lookup failed");

    assert_eq!(ips, vec![ip("93.184.216.34")]);
    assert_eq!(
        mock.queries(),
        vec![
            q(ROOT, "www.example.com"),
            q(COM, "www.example.com"),
            q(EXAMPLE, "www.example.com"),
        ]
    );
}

#[test_env_log::test]
fn test_ignores_unrelated_additionals() {
    // The only address in the additional section isn't for the nameserver,
    // so the nameserver has to be looked up from the root.
    let mut m = referral("example.com", &[("ns1.example.net", None)]);
    m.additionals.push(a("mail.example.com", "192.0.2.25"));

    let mock = MockExchanger::default()
        .on(ROOT, "example.com", m)
        .on(
            ROOT,
            "ns1.example.net",
            answer(vec![a("ns1.example.net", EXAMPLE)]),
        )
        .on(
            EXAMPLE,
            "example.com",
            answer(vec![a("example.com", "93.184.216.34")]),
        );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let ips = resolver
        .lookup_ip(&Context::background(), "example.com")
        .expect("lookup failed");

    assert_eq!(ips, vec![ip("93.184.216.34")]);
    assert_eq!(
        mock.queries(),
        vec![
            q(ROOT, "example.com"),
            q(ROOT, "ns1.example.net"),
            q(EXAMPLE, "example.com"),
        ]
    );
}

#[test_env_log::test]
fn test_resolves_nameserver_from_root() {
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "example.com",
            referral("com", &[("a.gtld-servers.net", Some(COM))]),
        )
        .on(
            COM,
            "example.com",
            referral("example.com", &[("ns1.example.net", None)]),
        )
        .on(
            ROOT,
            "ns1.example.net",
            referral("net", &[("a.gtld-servers.net", Some(COM))]),
        )
        .on(
            COM,
            "ns1.example.net",
            // The private address must be skipped.
            answer(vec![
                a("ns1.example.net", "10.0.0.53"),
                a("ns1.example.net", EXAMPLE),
            ]),
        )
        .on(
            EXAMPLE,
            "example.com",
            answer(vec![a("example.com", "93.184.216.34")]),
        );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let ips = resolver
        .lookup_ip(&Context::background(), "example.com")
        .expect("lookup failed");

    assert_eq!(ips, vec![ip("93.184.216.34")]);
    assert_eq!(
        mock.queries(),
        vec![
            q(ROOT, "example.com"),
            q(COM, "example.com"),
            q(ROOT, "ns1.example.net"),
            q(COM, "ns1.example.net"),
            q(EXAMPLE, "example.com"),
        ]
    );
}

#[test_env_log::test]
fn test_private_nameservers_only() {
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "example.com",
            referral("example.com", &[("ns1.example.net", None)]),
        )
        .on(
            ROOT,
            "ns1.example.net",
            answer(vec![a("ns1.example.net", "192.168.1.53")]),
        );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let err = resolver
        .lookup_ip(&Context::background(), "example.com")
        .unwrap_err();

    match &err {
        Error::Unresolved { domain, message } => {
            assert_eq!(domain, "example.com");
            assert_eq!(message.authorities.len(), 1);
        }
        e => panic!("unexpected error {:?}", e),
    }
    assert_eq!(err.to_string(), "failed to resolve example.com to an IP");
}

#[test_env_log::test]
fn test_follows_cname_on_same_server() {
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "www.example.org",
            answer(vec![record(
                "www.example.org",
                Resource::CNAME("web.example.org".to_string()),
            )]),
        )
        .on(
            ROOT,
            "web.example.org",
            answer(vec![a("web.example.org", "93.184.216.34")]),
        );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let ips = resolver
        .lookup_ip(&Context::background(), "www.example.org")
        .expect("lookup failed");

    assert_eq!(ips, vec![ip("93.184.216.34")]);
    assert_eq!(
        mock.queries(),
        vec![q(ROOT, "www.example.org"), q(ROOT, "web.example.org")]
    );
}

#[test_env_log::test]
fn test_unresolved_carries_message() {
    let mut empty = Message::default();
    empty.header.flags = 0x8403; // qr aa NXDomain

    let mock = MockExchanger::default().on(ROOT, "nope.example", empty);
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let err = resolver
        .lookup_ip(&Context::background(), "nope.example")
        .unwrap_err();

    assert_eq!(err.to_string(), "failed to resolve nope.example to an IP");

    let m = err.message().expect("error should carry the last message");
    assert_eq!(m.header.rcode(), Some(Rcode::NXDomain));
    assert_eq!(m.questions[0].name, "nope.example");
}

#[test_env_log::test]
fn test_nameserver_failure_is_wrapped() {
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "example.com",
            referral("example.com", &[("ns1.example.net", None)]),
        )
        .on(ROOT, "ns1.example.net", Message::default());
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let err = resolver
        .lookup_ip(&Context::background(), "example.com")
        .unwrap_err();

    match &err {
        Error::NameServer { nameserver, source } => {
            assert_eq!(nameserver, "ns1.example.net");
            assert!(matches!(**source, Error::Unresolved { .. }));
        }
        e => panic!("unexpected error {:?}", e),
    }
    assert_eq!(
        err.to_string(),
        "error resolving nameserver ns1.example.net: failed to resolve ns1.example.net to an IP"
    );
    assert!(err.message().is_some());
}

#[test_env_log::test]
fn test_network_error() {
    // Nothing is scripted, so the first query times out.
    let mock = MockExchanger::default();
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let err = resolver
        .lookup_ip(&Context::background(), "example.com")
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { server } if server == SocketAddr::new(ip(ROOT), 53)));
}

#[test_env_log::test]
fn test_depth_exceeded() {
    // A nameserver that keeps referring back to itself.
    let loopy = "192.0.2.1";
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "example.com",
            referral("example.com", &[("ns.loop.example", Some(loopy))]),
        )
        .on(
            loopy,
            "example.com",
            referral("example.com", &[("ns.loop.example", Some(loopy))]),
        );

    let config = Config {
        max_depth: 5,
        ..config(&[ROOT])
    };
    let resolver = Resolver::with_config(config, &mock);

    let err = resolver
        .lookup_ip(&Context::background(), "example.com")
        .unwrap_err();

    match err {
        Error::DepthExceeded { domain, max } => {
            assert_eq!(domain, "example.com");
            assert_eq!(max, 5);
        }
        e => panic!("unexpected error {:?}", e),
    }
    assert_eq!(mock.queries().len(), 5);
}

#[test_env_log::test]
fn test_depth_counts_nameserver_lookups() {
    let mock = MockExchanger::default()
        .on(
            ROOT,
            "example.com",
            referral("example.com", &[("ns1.example.net", None)]),
        )
        .on(
            ROOT,
            "ns1.example.net",
            referral("example.net", &[("ns1.example.com", None)]),
        )
        .on(
            ROOT,
            "ns1.example.com",
            referral("example.com", &[("ns1.example.net", None)]),
        );

    let config = Config {
        max_depth: 4,
        ..config(&[ROOT])
    };
    let resolver = Resolver::with_config(config, &mock);

    let err = resolver
        .lookup_ip(&Context::background(), "example.com")
        .unwrap_err();

    // The nameservers depend on each other, so the limit is hit several
    // lookups deep, and reported as is rather than as a nameserver failure.
    match err {
        Error::DepthExceeded { domain, max } => {
            assert_eq!(domain, "ns1.example.com");
            assert_eq!(max, 4);
        }
        e => panic!("unexpected error {:?}", e),
    }
    assert_eq!(mock.queries().len(), 4);
}

#[test_env_log::test]
fn test_cancelled() {
    let mock = MockExchanger::default().on(
        ROOT,
        "example.com",
        answer(vec![a("example.com", "93.184.216.34")]),
    );
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let (ctx, cancel) = Context::cancellable();
    cancel.cancel();

    let err = resolver.lookup_ip(&ctx, "example.com").unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(mock.queries().is_empty());
}

#[test_env_log::test]
fn test_deadline_passed() {
    let mock = MockExchanger::default();
    let resolver = Resolver::with_config(config(&[ROOT]), &mock);

    let ctx = Context::with_timeout(Duration::from_secs(0));
    let err = resolver.lookup_ip(&ctx, "example.com").unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(mock.queries().is_empty());
}

#[test_env_log::test]
fn test_cancelled_during_nameserver_lookup() {
    /// Cancels the lookup once it starts looking up a nameserver.
    struct CancellingExchanger {
        inner: MockExchanger,
        cancel: rootwalk::clients::CancelHandle,
    }

    impl Exchanger for CancellingExchanger {
        fn exchange(
            &self,
            ctx: &Context,
            server: SocketAddr,
            query: &Query,
        ) -> Result<Message, Error> {
            if query.question.name == "ns1.example.net" {
                self.cancel.cancel();
            }
            self.inner.exchange(ctx, server, query)
        }
    }

    let (ctx, cancel) = Context::cancellable();
    let client = CancellingExchanger {
        inner: MockExchanger::default().on(
            ROOT,
            "example.com",
            referral("example.com", &[("ns1.example.net", None)]),
        ),
        cancel,
    };
    let resolver = Resolver::with_config(config(&[ROOT]), &client);

    let err = resolver.lookup_ip(&ctx, "example.com").unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[test_env_log::test]
fn test_round_robin_roots() {
    let roots = ["198.41.0.4", "199.9.14.201", "192.33.4.12"];

    let mut mock = MockExchanger::default();
    for root in roots.iter() {
        mock = mock.on(root, "example.com", answer(vec![a("example.com", "93.184.216.34")]));
    }
    let resolver = Resolver::with_config(config(&roots), &mock);

    for _ in 0..4 {
        resolver
            .lookup_ip(&Context::background(), "example.com")
            .expect("lookup failed");
    }

    let servers: Vec<String> = mock.queries().into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        servers,
        vec!["198.41.0.4", "199.9.14.201", "192.33.4.12", "198.41.0.4"]
    );
}

#[test_env_log::test]
fn test_seeded_lookups_are_deterministic() {
    let glue: Vec<String> = (1..=8).map(|i| format!("192.0.2.{}", i)).collect();
    let names: Vec<String> = (1..=8).map(|i| format!("ns{}.example.com", i)).collect();

    let script = || {
        let nameservers: Vec<(&str, Option<&str>)> = names
            .iter()
            .zip(glue.iter())
            .map(|(n, g)| (n.as_str(), Some(g.as_str())))
            .collect();

        let mut mock = MockExchanger::default().on(
            ROOT,
            "example.com",
            referral("example.com", &nameservers),
        );
        for g in glue.iter() {
            mock = mock.on(g, "example.com", answer(vec![a("example.com", "93.184.216.34")]));
        }
        mock
    };

    let run = |seed| {
        let mock = script();
        let config = Config {
            seed: Some(seed),
            ..config(&[ROOT])
        };
        let resolver = Resolver::with_config(config, &mock);
        for _ in 0..5 {
            resolver
                .lookup_ip(&Context::background(), "example.com")
                .expect("lookup failed");
        }
        mock.queries()
    };

    assert_eq!(run(42), run(42));
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.root_servers.len(), 13);
    assert_eq!(config.root_servers[0], ip("198.41.0.4"));
    assert_eq!(config.port, 53);
    assert_eq!(config.query_timeout, Duration::from_secs(5));
    assert_eq!(config.max_depth, 24);
    assert_eq!(config.seed, None);
}
