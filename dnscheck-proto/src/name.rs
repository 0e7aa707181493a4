//! Domain names.

use std::collections::VecDeque;
use std::fmt::Display;
use std::io::{Cursor, Read, Write};

use byteorder::ReadBytesExt;
use smartstring::{LazyCompact, SmartString};

use crate::error::{EncodeError, ParseError};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Upper bound for compression pointers followed while parsing a single name. A name has at most
/// 127 labels, so a well-formed message never needs more jumps than that.
const MAX_POINTER_JUMPS: usize = 127;

type Label = SmartString<LazyCompact>;

/// A DNS domain name.
///
/// Names compare equal regardless of ASCII case, as DNS itself does.
///
/// The text form has no trailing dot, except for the root, which is written as `"."`.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Eq, Clone, Debug)]
pub struct Name {
    // without the empty root label
    labels: VecDeque<Label>,
}

impl Name {
    /// Returns a `Name` representing the DNS root (`"."`).
    ///
    /// # Examples
    /// ```rust
    /// use dnscheck_proto::Name;
    ///
    /// assert_eq!(Name::from_ascii(".").ok(), Some(Name::root()));
    /// ```
    pub fn root() -> Self {
        Self {
            labels: VecDeque::new(),
        }
    }

    /// Parses a `Name` encoded as a DNS QNAME from the given cursor, following message
    /// compression pointers.
    ///
    /// After parsing, the cursor points to the first byte after the name as it appears at the
    /// original position, i.e. after the first compression pointer if there was one.
    ///
    /// # Examples
    /// ```rust
    /// use std::io::Cursor;
    /// use dnscheck_proto::Name;
    ///
    /// // "sub.example.com" encoded via the "sub" label followed by a pointer to "example.com"
    /// let bytes = b"\x07example\x03com\0\x03sub\xc0\x00";
    /// let mut cursor = Cursor::new(bytes as &[u8]);
    /// let example = Name::from_ascii("example.com").unwrap();
    /// let sub = Name::from_ascii("sub.example.com").unwrap();
    /// assert_eq!(Name::parse(&mut cursor).ok(), Some(example));
    /// assert_eq!(Name::parse(&mut cursor).ok(), Some(sub));
    /// assert_eq!(cursor.position(), bytes.len() as u64);
    /// ```
    pub fn parse(msg: &mut Cursor<&[u8]>) -> Result<Self, ParseError> {
        let mut labels: VecDeque<Label> = VecDeque::new();
        let mut encoded_len = 1;
        let mut resume_at = None;
        let mut jumps = 0;

        loop {
            let c = msg.read_u8()?; // length of next label
            if c == 0 {
                break;
            }

            if (c & 0b11000000) == 0b11000000 {
                jumps += 1;
                if jumps > MAX_POINTER_JUMPS {
                    return Err(ParseError::CompressionLoop);
                }
                let offset = (((c & 0b00111111) as u64) << 8) + msg.read_u8()? as u64;
                // only the first pointer decides where parsing continues afterwards
                if resume_at.is_none() {
                    resume_at = Some(msg.position());
                }
                msg.set_position(offset);
                continue;
            } else if (c & 0b11000000) != 0 {
                return Err(ParseError::InvalidLabelType(c));
            }

            encoded_len += 1 + c as usize;
            if encoded_len > 255 {
                return Err(ParseError::NameTooLong(encoded_len));
            }

            let mut raw = vec![0; c as usize];
            msg.read_exact(&mut raw)?;
            // labels are kept as text, so every octet must stand for exactly one character
            if let Some(&octet) = raw.iter().find(|&&b| !b.is_ascii_graphic() || b == b'.') {
                return Err(ParseError::InvalidLabelOctet(octet));
            }
            labels.push_back(raw.into_iter().map(char::from).collect());
        }

        if let Some(pos) = resume_at {
            msg.set_position(pos);
        }

        Ok(Name { labels })
    }

    /// Constructs a `Name` from an ASCII domain string.
    ///
    /// Every label must consist of the characters `a-z`, `A-Z`, `0-9`, `_`, `-`, and must neither
    /// start nor end with `-`. The first label may also be a wildcard (`"*"`). A single trailing
    /// dot is allowed, but not necessary.
    ///
    /// # Examples
    /// ```rust
    /// use dnscheck_proto::Name;
    ///
    /// assert_eq!(Name::from_ascii(".").ok(), Some(Name::root()));
    /// assert_eq!(Name::from_ascii("").ok(), Some(Name::root()));
    ///
    /// assert_eq!(
    ///     Name::from_ascii("example.com.").unwrap(),
    ///     Name::from_ascii("example.com").unwrap(),
    /// );
    /// assert!(Name::from_ascii("_dmarc.example.com").is_ok());
    ///
    /// assert!(Name::from_ascii("example..com").is_err());
    /// assert!(Name::from_ascii("example.com..").is_err());
    /// assert!(Name::from_ascii("exa-mple-.com").is_err());
    /// assert!(Name::from_ascii("exämple.com").is_err());
    /// ```
    pub fn from_ascii(name: impl AsRef<str>) -> Result<Self, ParseError> {
        let name = name.as_ref();
        if name.len() > 255 {
            return Err(ParseError::NameTooLong(name.len()));
        }

        let relative = match name {
            "" | "." => return Ok(Self::root()),
            _ => name.strip_suffix('.').unwrap_or(name),
        };
        let labels = relative
            .split('.')
            .enumerate()
            .map(|(idx, label)| {
                Name::check_label(label, idx == 0)?;
                Ok(label.into())
            })
            .collect::<Result<VecDeque<Label>, ParseError>>()?;

        Ok(Name { labels })
    }

    /// Writes the name in wire format, without compression, and returns the number of bytes
    /// written.
    ///
    /// # Examples
    /// ```rust
    /// use dnscheck_proto::Name;
    ///
    /// let mut buf = Vec::new();
    /// let name = Name::from_ascii("example.com").unwrap();
    /// name.encode_into(&mut buf).ok();
    /// assert_eq!(buf, b"\x07example\x03com\0");
    /// ```
    pub fn encode_into(&self, buf: &mut impl Write) -> Result<u16, EncodeError> {
        let mut wire = Vec::with_capacity(64);
        for label in &self.labels {
            wire.push(label.len() as u8);
            wire.extend_from_slice(label.as_bytes());
        }
        wire.push(0);
        if wire.len() > 255 {
            return Err(EncodeError::DomainTooLong(wire.len()));
        }

        buf.write_all(&wire)?;
        Ok(wire.len() as u16)
    }

    /// Whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Validates one label of a name in text form. Only the first label may be the wildcard `*`.
    fn check_label(label: &str, first: bool) -> Result<(), ParseError> {
        if label.is_empty() {
            return Err(ParseError::EmptyLabel);
        }
        if label.len() > 63 {
            return Err(ParseError::LabelTooLong(label.len()));
        }
        if first && label == "*" {
            return Ok(());
        }

        let inner_ok = label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !inner_ok || label.starts_with('-') || label.ends_with('-') {
            return Err(ParseError::NameInvalidChars);
        }
        Ok(())
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let text: Vec<&str> = self.labels.iter().map(|label| label.as_str()).collect();
        f.write_str(&text.join("."))
    }
}
