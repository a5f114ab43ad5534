//! A DNS message codec and an iterative resolver that walks from the root
//! nameservers down to an answer.
//!
//! # Example
//!
//! ```rust,no_run
//! use rootwalk::clients::{Context, Resolver};
//! use std::time::Duration;
//!
//! let resolver = Resolver::new();
//! let ctx = Context::with_timeout(Duration::from_secs(30));
//!
//! match resolver.lookup_ip(&ctx, "www.example.com") {
//!     Ok(ips) => println!("{:?}", ips),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! Messages can also be parsed directly:
//!
//! ```rust
//! use rootwalk::Message;
//!
//! let m = Message::from_slice(&[0x13, 0x14, 0x81, 0x80, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
//! assert_eq!(m.header.id, 0x1314);
//! assert!(m.header.is_response());
//! ```

pub mod clients;
mod display;
pub mod dns;
pub mod errors;
pub mod io;
pub mod resource;
pub mod types;

#[macro_use]
extern crate num_derive;

pub use crate::types::*;

// Pull up the various types that should be on the front page of the docs.
#[doc(inline)]
pub use crate::types::Message;
#[doc(inline)]
pub use crate::types::Question;
#[doc(inline)]
pub use crate::types::Record;

#[doc(inline)]
pub use crate::types::Class;

#[doc(inline)]
pub use crate::types::Type;

#[doc(inline)]
pub use crate::errors::{Error, ParseError, WriteError};

#[doc(inline)]
pub use crate::io::ByteCursor;

#[doc(inline)]
pub use crate::clients::{Context, Resolver};
