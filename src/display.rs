//! Implements the Display trait for the various types, so they output
//! in `dig` style.
// Refer to https://github.com/tigeli/bind-utils/blob/master/bin/dig/dig.c for reference.

use crate::Header;
use crate::Message;
use crate::Question;
use crate::Record;
use crate::Resource;
use std::fmt;

/// Displays this message in a format resembling `dig` output.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.header)?;

        // Always display the question section, but optionally
        // display the other sections.
        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            write!(f, "{}", question)?;
        }
        writeln!(f)?;

        let sections = [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authorities),
            ("ADDITIONAL", &self.additionals),
        ];
        for (title, records) in sections.iter() {
            if records.is_empty() {
                continue;
            }

            writeln!(f, ";; {} SECTION:", title)?;
            for record in records.iter() {
                write!(f, "{}", record)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let opcode = match self.opcode() {
            Some(opcode) => opcode.to_string(),
            None => format!("OPCODE{}", (self.flags >> 11) & 0b1111),
        };
        let rcode = match self.rcode() {
            Some(rcode) => rcode.to_string(),
            None => format!("RCODE{}", self.flags & 0b1111),
        };

        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {opcode}, status: {rcode}, id: {id}",
            opcode = opcode,
            rcode = rcode,
            id = self.id,
        )?;

        let mut flags = String::new();

        if self.is_response() {
            flags.push_str(" qr")
        }
        if self.is_authoritative() {
            flags.push_str(" aa")
        }
        if self.is_truncated() {
            flags.push_str(" tc")
        }
        if self.recursion_desired() {
            flags.push_str(" rd")
        }
        if self.recursion_available() {
            flags.push_str(" ra")
        }

        writeln!(f, ";; flags:{flags}; QUERY: {qd_count}, ANSWER: {an_count}, AUTHORITY: {ns_count}, ADDITIONAL: {ar_count}",
            flags = flags,
            qd_count = self.question_count,
            an_count = self.answer_count,
            ns_count = self.authority_count,
            ar_count = self.additional_count,
        )?;

        writeln!(f)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            ";{name:<23} {class:4} {type:6}",
            name = fqdn(&self.name),
            class = self.class,
            r#type = self.r#type,
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{name:<20} {ttl:>6} {class:4} {type:6} {resource}",
            name = fqdn(&self.name),
            ttl = self.ttl.as_secs(),
            class = self.class,
            r#type = self.r#type,
            resource = self.resource,
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::A(ips) => join(f, ips),
            Resource::AAAA(ips) => join(f, ips),

            Resource::NS(name) | Resource::CNAME(name) | Resource::PTR(name) => {
                write!(f, "{}", fqdn(name))
            }

            // The generic form from rfc3597.
            Resource::Other(data) => {
                write!(f, "\\# {}", data.len())?;
                if !data.is_empty() {
                    write!(f, " ")?;
                }
                for b in data {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        item.fmt(f)?;
    }
    Ok(())
}

/// Names are stored without the trailing dot, but dig shows it.
fn fqdn(name: &str) -> String {
    format!("{}.", name)
}
