// Resolves domains by walking from the root nameservers.
// resolve [--debug] [--timeout secs] [--server ip] {domain}...
mod util;

use clap::Parser;
use log::LevelFilter;
use rootwalk::clients::{Config, Context, Exchanger, Resolver, UdpClient};
use rootwalk::{Query, Type};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

// A simple type alias so as to DRY.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Used when no domains are given on the command line.
const DEFAULT_DOMAINS: [&str; 4] = ["example.com", "facebook.com", "google.com", "twitter.com"];

#[derive(Parser, Debug)]
#[command(name = "resolve", version, about = "Resolve domains starting at the root nameservers")]
struct Args {
    /// Enable debug logging (also enabled by the DEBUG environment variable)
    #[arg(long)]
    debug: bool,

    /// Seconds to wait for each nameserver to reply
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Send one query to this nameserver and dump the exchange, instead of
    /// resolving from the root
    #[arg(long, value_name = "IP")]
    server: Option<IpAddr>,

    /// Domains to resolve
    domains: Vec<String>,
}

fn domains(args: &Args) -> Vec<String> {
    if !args.domains.is_empty() {
        return args.domains.clone();
    }

    // Use a default set of domains to exercise resolution.
    let mut domains: Vec<String> = DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect();
    domains.extend(DEFAULT_DOMAINS.iter().map(|d| format!("www.{}", d)));
    domains
}

fn init_logger(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

/// Sends a single query to `server` and prints both messages.
fn dump(server: SocketAddr, domain: &str, timeout: Duration) -> Result<()> {
    let query = Query::new(domain, Type::A);

    println!("query:");
    util::hexdump(&query.to_vec()?);
    println!();

    let ctx = Context::with_timeout(timeout);
    let resp = UdpClient::default().exchange(&ctx, server, &query)?;

    println!("response:");
    println!("{}", resp);

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.debug || util::debug_env(env::var("DEBUG").ok().as_deref()));

    let timeout = Duration::from_secs(args.timeout);
    let config = Config {
        query_timeout: timeout,
        ..Default::default()
    };
    let resolver = Resolver::with_config(config, UdpClient::default());

    for domain in domains(&args) {
        if let Some(server) = args.server {
            let addr = SocketAddr::new(server, resolver.config().port);
            if let Err(e) = dump(addr, &domain, timeout) {
                println!("error querying {} for {}: {}", server, domain, e);
            }
            continue;
        }

        println!("\nresolving {} ...", domain);
        match resolver.lookup_ip(&Context::background(), &domain) {
            Ok(ips) => println!("{} resolves to: {:?}", domain, ips),
            Err(e) => println!("error resolving {}: {}", domain, e),
        }
    }
}
