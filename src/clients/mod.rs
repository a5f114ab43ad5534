use crate::errors::Error;
use crate::{Message, Query};
use std::net::SocketAddr;

pub use self::context::{CancelHandle, Context};
pub use self::resolver::{Config, Resolver, ROOT_SERVERS};
pub use self::udp::UdpClient;

mod context;
mod resolver;
mod udp;

/// Exchanger sends a query to one nameserver and returns its response.
///
/// The [`Resolver`] only talks to the network through this trait, so it can
/// be driven by something other than a [`UdpClient`] (for example a scripted
/// set of responses in tests).
pub trait Exchanger {
    /// Sends `query` to `server` and waits for the reply, giving up when `ctx`
    /// is cancelled or its deadline passes.
    fn exchange(&self, ctx: &Context, server: SocketAddr, query: &Query) -> Result<Message, Error>;
}

impl<E: Exchanger + ?Sized> Exchanger for &E {
    fn exchange(&self, ctx: &Context, server: SocketAddr, query: &Query) -> Result<Message, Error> {
        (**self).exchange(ctx, server, query)
    }
}
