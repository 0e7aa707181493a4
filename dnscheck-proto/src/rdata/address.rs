//! Address records: `A` and `AAAA`.

use std::fmt::{self, Display};
use std::io::Cursor;
use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{NetworkEndian, ReadBytesExt};

use super::RdataCodec;
use crate::error::{EncodeError, ParseError};

#[cfg(feature = "serde")]
use serde::Serialize;

/// An IPv4 host address. [\[RFC 1035\]](https://www.rfc-editor.org/rfc/rfc1035)
///
/// Hosts with several addresses have several `A` records.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct A {
    pub address: Ipv4Addr,
}

/// An IPv6 host address. [\[RFC 3596\]](https://www.rfc-editor.org/rfc/rfc3596)
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct AAAA {
    pub address: Ipv6Addr,
}

fn expect_len(rtype: &'static str, expected: u16, rdlength: u16) -> Result<(), ParseError> {
    if rdlength == expected {
        Ok(())
    } else {
        Err(ParseError::InvalidRdataLength(rtype, expected, rdlength))
    }
}

impl RdataCodec for A {
    fn decode(msg: &mut Cursor<&[u8]>, rdlength: u16) -> Result<Self, ParseError> {
        expect_len("A", 4, rdlength)?;
        let address = msg.read_u32::<NetworkEndian>()?.into();
        Ok(Self { address })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        buf.extend_from_slice(&self.address.octets());
        Ok(())
    }
}

impl RdataCodec for AAAA {
    fn decode(msg: &mut Cursor<&[u8]>, rdlength: u16) -> Result<Self, ParseError> {
        expect_len("AAAA", 16, rdlength)?;
        let address = msg.read_u128::<NetworkEndian>()?.into();
        Ok(Self { address })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        buf.extend_from_slice(&self.address.octets());
        Ok(())
    }
}

impl Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::Ipv6Addr;

    use super::{RdataCodec, A, AAAA};
    use crate::error::ParseError;

    #[test]
    fn wrong_length_is_rejected() {
        let bytes = [0u8; 16];
        assert!(matches!(
            A::decode(&mut Cursor::new(&bytes[..]), 16),
            Err(ParseError::InvalidRdataLength("A", 4, 16))
        ));
        assert!(matches!(
            AAAA::decode(&mut Cursor::new(&bytes[..]), 4),
            Err(ParseError::InvalidRdataLength("AAAA", 16, 4))
        ));
    }

    #[test]
    fn aaaa_text_form() {
        let mut bytes = vec![0x20, 0x01, 0x0d, 0xb8];
        bytes.resize(15, 0);
        bytes.push(1);
        let aaaa = AAAA::decode(&mut Cursor::new(&bytes[..]), 16).unwrap();
        assert_eq!(aaaa.address, Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        assert_eq!(aaaa.to_string(), "2001:db8::1");

        let mut encoded = Vec::new();
        aaaa.encode_into(&mut encoded).unwrap();
        assert_eq!(encoded, bytes);
    }
}
