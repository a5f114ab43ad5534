use crate::types::{Message, Type};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors produced while decoding a DNS message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("cannot read {len} bytes (offset={offset} size={size})")]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("invalid offset (offset={offset} size={size})")]
    InvalidOffset { offset: usize, size: usize },

    #[error("invalid range buf[{start}..{end}] for buffer of size {size}")]
    InvalidRange {
        start: usize,
        end: usize,
        size: usize,
    },

    #[error("more than {max} compression pointers followed for name at offset {offset}")]
    TooManyPointers { offset: usize, max: usize },

    #[error("unsupported label type {0:#010b}")]
    UnsupportedLabel(u8),

    #[error("invalid label at offset {offset}: {reason}")]
    InvalidLabel { offset: usize, reason: &'static str },

    #[error("invalid {record_type} record data length {len}")]
    InvalidAddress { record_type: Type, len: usize },

    #[error("{record_type} record name length ({name_len}) did not match record data length ({data_len})")]
    NameLength {
        record_type: Type,
        name_len: usize,
        data_len: usize,
    },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::Context { source, .. } => source.root_cause(),
            e => e,
        }
    }
}

/// Adds a location to a [`ParseError`] as it travels up through the parser.
pub(crate) trait ResultExt<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T, ParseError>;

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> Result<T, ParseError>;
}

impl<T> ResultExt<T> for Result<T, ParseError> {
    fn context<C: Into<String>>(self, context: C) -> Result<T, ParseError> {
        self.map_err(|e| ParseError::Context {
            context: context.into(),
            source: Box::new(e),
        })
    }

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> Result<T, ParseError> {
        self.map_err(|e| ParseError::Context {
            context: f().into(),
            source: Box::new(e),
        })
    }
}

/// Errors produced while encoding a DNS message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("label '{label}' is {len} bytes, longer than 63")]
    LabelTooLong { label: String, len: usize },

    #[error("empty label in domain name '{name}'")]
    EmptyLabel { name: String },

    #[error("domain name '{name}' encodes to {len} bytes, longer than 255")]
    NameTooLong { name: String, len: usize },
}

/// Errors returned by the clients and the [`Resolver`](crate::clients::Resolver).
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to encode query: {0}")]
    Write(#[from] WriteError),

    #[error("error exchanging message with nameserver {server}: {source}")]
    Io {
        server: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("timed out waiting for a response from nameserver {server}")]
    Timeout { server: SocketAddr },

    #[error("failed to parse response from nameserver {server}: {source}")]
    Parse {
        server: SocketAddr,
        #[source]
        source: ParseError,
    },

    #[error("nameserver {server} answered with id {got}, expected {expected}")]
    IdMismatch {
        server: SocketAddr,
        expected: u16,
        got: u16,
    },

    #[error("error resolving nameserver {nameserver}: {source}")]
    NameServer {
        nameserver: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to resolve {domain} to an IP")]
    Unresolved {
        domain: String,
        message: Box<Message>,
    },

    #[error("exceeded maximum depth of {max} resolving {domain}")]
    DepthExceeded { domain: String, max: usize },

    #[error("lookup cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// Returns the last message received before resolution gave up, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Error::Unresolved { message, .. } => Some(message),
            Error::NameServer { source, .. } => source.message(),
            _ => None,
        }
    }
}
