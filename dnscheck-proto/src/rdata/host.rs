//! Records that point at another host: `NS`, `CNAME` and `MX`.

use std::fmt::{self, Display};
use std::io::Cursor;

use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};

use super::RdataCodec;
use crate::error::{EncodeError, ParseError};
use crate::name::Name;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Defines a record type whose RDATA is exactly one domain name.
macro_rules! name_rdata {
    ($(#[$meta:meta])* $kind:ident { $field:ident }) => {
        $(#[$meta])*
        #[cfg_attr(feature = "serde", derive(Serialize))]
        #[derive(PartialEq, Eq, Clone, Debug)]
        pub struct $kind {
            pub $field: Name,
        }

        impl RdataCodec for $kind {
            fn decode(msg: &mut Cursor<&[u8]>, _rdlength: u16) -> Result<Self, ParseError> {
                Ok(Self {
                    $field: Name::parse(msg)?,
                })
            }

            fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
                self.$field.encode_into(buf).map(|_| ())
            }
        }

        impl Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.$field)
            }
        }
    };
}

name_rdata! {
    /// An authoritative nameserver of the owner's zone.
    /// [\[RFC 1035\]](https://www.rfc-editor.org/rfc/rfc1035)
    NS { name }
}

name_rdata! {
    /// Declares the owner an alias of `target`.
    /// [\[RFC 1035\]](https://www.rfc-editor.org/rfc/rfc1035)
    ///
    /// Answers for an alias start with its `CNAME`, followed by the records of the target.
    CNAME { target }
}

/// A mail exchange for the owner. [\[RFC 1035\]](https://www.rfc-editor.org/rfc/rfc1035)
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MX {
    /// Lower values are preferred.
    pub preference: u16,
    pub exchange: Name,
}

impl RdataCodec for MX {
    fn decode(msg: &mut Cursor<&[u8]>, _rdlength: u16) -> Result<Self, ParseError> {
        let preference = msg.read_u16::<NetworkEndian>()?;
        let exchange = Name::parse(msg)?;
        Ok(Self {
            preference,
            exchange,
        })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        buf.write_u16::<NetworkEndian>(self.preference)?;
        self.exchange.encode_into(buf)?;
        Ok(())
    }
}

impl Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}
