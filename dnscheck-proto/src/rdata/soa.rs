//! `SOA` RDATA.

use std::fmt::{self, Display};
use std::io::Cursor;

use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};

use super::RdataCodec;
use crate::error::{EncodeError, ParseError};
use crate::name::Name;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The start of a zone of authority. [\[RFC 1035\]](https://www.rfc-editor.org/rfc/rfc1035)
///
/// Negative answers carry the zone's `SOA` in their authority section; the owner of that record
/// is the zone apex.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SOA {
    /// The primary nameserver of the zone.
    pub mname: Name,
    /// The mailbox of the zone's administrator, with the `@` replaced by a dot.
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    /// TTL for negative answers. [\[RFC 2308\]](https://www.rfc-editor.org/rfc/rfc2308)
    pub minimum: u32,
}

impl SOA {
    fn counters(&self) -> [u32; 5] {
        [
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum,
        ]
    }
}

impl RdataCodec for SOA {
    fn decode(msg: &mut Cursor<&[u8]>, _rdlength: u16) -> Result<Self, ParseError> {
        let mname = Name::parse(msg)?;
        let rname = Name::parse(msg)?;
        let mut counters = [0; 5];
        for counter in &mut counters {
            *counter = msg.read_u32::<NetworkEndian>()?;
        }
        let [serial, refresh, retry, expire, minimum] = counters;

        Ok(Self {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.mname.encode_into(buf)?;
        self.rname.encode_into(buf)?;
        for counter in self.counters() {
            buf.write_u32::<NetworkEndian>(counter)?;
        }
        Ok(())
    }
}

impl Display for SOA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mname, self.rname)?;
        for counter in self.counters() {
            write!(f, " {}", counter)?;
        }
        Ok(())
    }
}
