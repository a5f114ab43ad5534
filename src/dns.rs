//! Encoding of queries and decoding of messages, as defined by [rfc1035].
//!
//! [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035

use crate::errors::{ParseError, ResultExt, WriteError};
use crate::io::ByteCursor;
use crate::resource::parse_resource;
use crate::types::*;
use byteorder::{ByteOrder, BE};
use std::time::Duration;

/// Longest label allowed. [rfc1035#section-2.3.4]
///
/// [rfc1035#section-2.3.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.4
const MAX_LABEL_LEN: usize = 63;

/// Longest encoded name allowed, including the length bytes and terminator.
const MAX_NAME_LEN: usize = 255;

/// Most compression pointers followed while decoding a single name. A real
/// message never needs more than a handful; this stops pointer loops.
pub const MAX_POINTER_HOPS: usize = 16;

/// Encodes a domain name by prefixing each label with its length and appending
/// a zero byte, so "google.com" is encoded as "6 google 3 com 0".
///
/// A single trailing dot is allowed, and both "" and "." encode the root.
pub fn encode_name(name: &str) -> Result<Vec<u8>, WriteError> {
    let mut buf = Vec::with_capacity(encoded_len(name));
    write_name(&mut buf, name)?;
    Ok(buf)
}

/// Number of bytes `name` takes once encoded.
fn encoded_len(name: &str) -> usize {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        1
    } else {
        trimmed.len() + 2
    }
}

/// Writes a domain name into the supplied `Vec<u8>`, uncompressed.
fn write_name(buf: &mut Vec<u8>, name: &str) -> Result<(), WriteError> {
    let start = buf.len();
    let trimmed = name.strip_suffix('.').unwrap_or(name);

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(WriteError::EmptyLabel {
                    name: name.to_string(),
                });
            }

            if label.len() > MAX_LABEL_LEN {
                return Err(WriteError::LabelTooLong {
                    label: label.to_string(),
                    len: label.len(),
                });
            }

            // Write the length.
            buf.push(label.len() as u8);

            // Then the actual label.
            buf.extend_from_slice(label.as_bytes());
        }
    }

    buf.push(0);

    let len = buf.len() - start;
    if len > MAX_NAME_LEN {
        return Err(WriteError::NameTooLong {
            name: name.to_string(),
            len,
        });
    }

    Ok(())
}

/// Decodes a domain name starting at the cursor, following compression
/// pointers. Labels are joined with '.', and the root decodes as "".
///
/// The cursor is left just past the name as it appears at its own position:
/// after the terminating zero byte, or after the two byte pointer that ends it.
pub fn decode_name(cur: &mut ByteCursor<'_>) -> Result<String, ParseError> {
    decode_name_hops(cur, 0)
}

fn decode_name_hops(cur: &mut ByteCursor<'_>, hops: usize) -> Result<String, ParseError> {
    let start = cur.offset();
    let mut labels = Vec::new();

    // Read each label one at a time, to build up the full domain name.
    loop {
        let len = cur.next_byte().context("reading label length")?;
        if len == 0 {
            break;
        }

        match len & 0b1100_0000 {
            // No compression
            0b0000_0000 => {
                let offset = cur.offset();
                let label = cur.next_bytes(len.into()).context("reading label")?;

                let label = match std::str::from_utf8(label) {
                    Ok(label) => label,
                    Err(_) => {
                        return Err(ParseError::InvalidLabel {
                            offset,
                            reason: "not valid UTF-8",
                        })
                    }
                };

                // The name is returned dot separated, so a dot inside a label
                // would change which labels it has.
                if label.contains('.') {
                    return Err(ParseError::InvalidLabel {
                        offset,
                        reason: "contains a '.'",
                    });
                }

                labels.push(label.to_string());
            }

            // Compression. The remaining 14 bits point at an earlier occurrence
            // of the rest of the name, see rfc1035#section-4.1.4.
            0b1100_0000 => {
                let b2 = cur.next_byte().context("reading compression pointer")?;
                let ptr = usize::from(BE::read_u16(&[len & 0b0011_1111, b2]));

                if hops >= MAX_POINTER_HOPS {
                    return Err(ParseError::TooManyPointers {
                        offset: start,
                        max: MAX_POINTER_HOPS,
                    });
                }

                // Jump using a second cursor, so our own position stays just
                // after the pointer.
                let mut target = cur
                    .rebased(ptr)
                    .with_context(|| format!("invalid compression pointer {}", ptr))?;
                let rest = decode_name_hops(&mut target, hops + 1)
                    .with_context(|| format!("decoding compressed name at offset {}", ptr))?;

                if !rest.is_empty() {
                    labels.push(rest);
                }

                // A pointer always ends the name.
                break;
            }

            // 0b01 and 0b10 were never assigned a meaning we support.
            _ => return Err(ParseError::UnsupportedLabel(len)),
        }
    }

    Ok(labels.join("."))
}

/// Parses the 12 byte header.
pub fn parse_header(cur: &mut ByteCursor<'_>) -> Result<Header, ParseError> {
    let b = cur.next_bytes(HEADER_SIZE)?;
    Ok(Header {
        id: BE::read_u16(&b[0..2]),
        flags: BE::read_u16(&b[2..4]),
        question_count: BE::read_u16(&b[4..6]),
        answer_count: BE::read_u16(&b[6..8]),
        authority_count: BE::read_u16(&b[8..10]),
        additional_count: BE::read_u16(&b[10..12]),
    })
}

/// Parses a single question.
pub fn parse_question(cur: &mut ByteCursor<'_>) -> Result<Question, ParseError> {
    let name = decode_name(cur).context("decoding name")?;

    // 2 bytes each for type and class
    let b = cur.next_bytes(4).context("reading type and class")?;

    Ok(Question {
        name,
        r#type: BE::read_u16(&b[0..2]).into(),
        class: BE::read_u16(&b[2..4]).into(),
    })
}

/// Parses a single resource record.
pub fn parse_record(cur: &mut ByteCursor<'_>) -> Result<Record, ParseError> {
    let name = decode_name(cur).context("decoding name")?;

    // 2 bytes each for type, class and data length, and 4 bytes for the TTL.
    let b = cur.next_bytes(10).context("reading metadata")?;

    let r#type: Type = BE::read_u16(&b[0..2]).into();
    let class: Class = BE::read_u16(&b[2..4]).into();
    let ttl = Duration::from_secs(BE::read_u32(&b[4..8]).into());
    let len = BE::read_u16(&b[8..10]);

    let resource = parse_resource(r#type, cur, len.into())?;

    Ok(Record {
        name,
        r#type,
        class,
        ttl,
        resource,
    })
}

/// Parses a whole message: the header, followed by exactly as many questions,
/// answers, authority and additional records as the header says.
pub fn parse_message(cur: &mut ByteCursor<'_>) -> Result<Message, ParseError> {
    MessageParser::new(cur).parse()
}

#[derive(Copy, Clone, PartialEq)]
enum RecordSection {
    Answers,
    Authorities,
    Additionals,
}

impl RecordSection {
    fn name(self) -> &'static str {
        match self {
            RecordSection::Answers => "answer",
            RecordSection::Authorities => "authority",
            RecordSection::Additionals => "additional",
        }
    }
}

// A helper class to hold state while the parsing is happening.
struct MessageParser<'a, 'b> {
    cur: &'b mut ByteCursor<'a>,

    m: Message,
}

impl<'a, 'b> MessageParser<'a, 'b> {
    fn new(cur: &'b mut ByteCursor<'a>) -> MessageParser<'a, 'b> {
        MessageParser {
            cur,
            m: Message::default(),
        }
    }

    /// Consume the MessageParser and returned the resulting Message.
    fn parse(mut self) -> Result<Message, ParseError> {
        self.m.header = parse_header(self.cur).context("header")?;

        self.read_questions(self.m.header.question_count)?;
        self.read_records(self.m.header.answer_count, RecordSection::Answers)?;
        self.read_records(self.m.header.authority_count, RecordSection::Authorities)?;
        self.read_records(self.m.header.additional_count, RecordSection::Additionals)?;

        Ok(self.m)
    }

    fn read_questions(&mut self, count: u16) -> Result<(), ParseError> {
        // Counts come from the wire, so don't trust them for more than the
        // bytes that are left.
        self.m.questions.reserve_exact(usize::from(count).min(self.cur.remaining()));

        for i in 0..count {
            let question = parse_question(self.cur).with_context(|| format!("question {}", i))?;
            self.m.questions.push(question);
        }

        Ok(())
    }

    fn read_records(&mut self, count: u16, section: RecordSection) -> Result<(), ParseError> {
        let records = match section {
            RecordSection::Answers => &mut self.m.answers,
            RecordSection::Authorities => &mut self.m.authorities,
            RecordSection::Additionals => &mut self.m.additionals,
        };
        records.reserve_exact(usize::from(count).min(self.cur.remaining()));

        for i in 0..count {
            let record =
                parse_record(self.cur).with_context(|| format!("{} {}", section.name(), i))?;
            records.push(record);
        }

        Ok(())
    }
}

impl Message {
    /// Decodes a message received from a nameserver.
    pub fn from_slice(buf: &[u8]) -> Result<Message, ParseError> {
        parse_message(&mut ByteCursor::new(buf))
    }
}

impl Header {
    /// Encodes the header as 12 bytes in network order.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut b = [0; HEADER_SIZE];
        BE::write_u16(&mut b[0..2], self.id);
        BE::write_u16(&mut b[2..4], self.flags);
        BE::write_u16(&mut b[4..6], self.question_count);
        BE::write_u16(&mut b[6..8], self.answer_count);
        BE::write_u16(&mut b[8..10], self.authority_count);
        BE::write_u16(&mut b[10..12], self.additional_count);
        b
    }
}

impl Question {
    /// Number of bytes this question takes once encoded.
    fn encoded_len(&self) -> usize {
        encoded_len(&self.name) + 4
    }

    /// Writes the question into the supplied `Vec<u8>` in network order.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<(), WriteError> {
        write_name(buf, &self.name)?;
        buf.extend_from_slice(&u16::from(self.r#type).to_be_bytes());
        buf.extend_from_slice(&u16::from(self.class).to_be_bytes());
        Ok(())
    }
}

impl Query {
    /// Returns this query as a Vec<u8> ready to be sent.
    pub fn to_vec(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.question.encoded_len());
        buf.extend_from_slice(&self.header.to_bytes());
        self.question.write(&mut buf)?;
        Ok(buf)
    }
}
