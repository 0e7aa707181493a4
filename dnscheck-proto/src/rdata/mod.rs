//! RDATA type definitions.
//!
//! Only the record kinds that a delegation check looks at, or may sensibly be asked to verify,
//! are decoded. Everything else is kept as raw bytes in [`Rdata::Unknown`].

use std::fmt::{self, Display};
use std::io::{Cursor, Read, Write};

use byteorder::ReadBytesExt;
use data_encoding::HEXUPPER;

use crate::error::{EncodeError, ParseError};
use crate::RecordType;

#[cfg(feature = "serde")]
use serde::Serialize;

mod address;
mod host;
mod soa;
mod txt;

pub use address::{A, AAAA};
pub use host::{CNAME, MX, NS};
pub use soa::SOA;
pub use txt::TXT;

/// Decoding and encoding of one kind of RDATA.
pub trait RdataCodec: Sized + Display {
    /// Decodes the RDATA starting at the cursor's position.
    ///
    /// The cursor wraps the complete message, which is needed to follow compression pointers in
    /// names. Implementations may rely on `rdlength` bytes being available.
    fn decode(msg: &mut Cursor<&[u8]>, rdlength: u16) -> Result<Self, ParseError>;

    /// Appends the encoded RDATA to `buf`, without compression.
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError>;
}

/// Declares [`Rdata`] with one variant per decodable type, named like its [`RecordType`] and
/// holding the struct of the same name.
macro_rules! rdata_kinds {
    ($($kind:ident => $as_kind:ident),+ $(,)?) => {
        /// The record data (RDATA) for a [`Record`][super::Record].
        #[cfg_attr(feature = "serde", derive(Serialize))]
        #[derive(PartialEq, Eq, Clone, Debug)]
        pub enum Rdata {
            $($kind($kind),)+
            /// RDATA of a type without a decoder, as raw bytes.
            Unknown(Vec<u8>),
        }

        impl Rdata {
            /// Parses `rdlength` bytes of RDATA of the given type. Types without a decoder become
            /// [`Rdata::Unknown`].
            ///
            /// Fails if the decoder does not consume exactly `rdlength` bytes.
            pub fn parse(
                rtype: RecordType,
                msg: &mut Cursor<&[u8]>,
                rdlength: u16,
            ) -> Result<Rdata, ParseError> {
                let start = msg.position();
                let rdata = match rtype {
                    $(RecordType::$kind => Rdata::$kind($kind::decode(msg, rdlength)?),)+
                    _ => {
                        let mut raw = vec![0; rdlength as usize];
                        msg.read_exact(&mut raw)?;
                        Rdata::Unknown(raw)
                    }
                };

                let consumed = msg.position() - start;
                if consumed != rdlength as u64 {
                    return Err(ParseError::RdataLengthMismatch(rtype, rdlength, consumed));
                }
                Ok(rdata)
            }

            /// Encodes the RDATA and returns the encoded bytes.
            pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
                let mut buf = Vec::new();
                match self {
                    $(Rdata::$kind(rdata) => rdata.encode_into(&mut buf)?,)+
                    Rdata::Unknown(raw) => buf.extend_from_slice(raw),
                }
                Ok(buf)
            }

            /// Returns the [`RecordType`] that matches this RDATA.
            ///
            /// [`Rdata::Unknown`] does not know its type and returns [`RecordType::Unknown(0)`];
            /// use [`Record::rtype`][super::Record::rtype] instead.
            pub fn rtype(&self) -> RecordType {
                match self {
                    $(Rdata::$kind(_) => RecordType::$kind,)+
                    Rdata::Unknown(_) => RecordType::Unknown(0),
                }
            }

            $(
                #[doc = concat!("Returns the inner [`", stringify!($kind), "`], if this is one.")]
                pub fn $as_kind(&self) -> Option<&$kind> {
                    match self {
                        Rdata::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }
            )+
        }

        $(
            impl From<$kind> for Rdata {
                fn from(rdata: $kind) -> Self {
                    Rdata::$kind(rdata)
                }
            }
        )+

        impl Display for Rdata {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Rdata::$kind(rdata) => write!(f, "{}", rdata),)+
                    // generic notation of RFC 3597
                    Rdata::Unknown(raw) => write!(f, "\\# {} {}", raw.len(), HEXUPPER.encode(raw)),
                }
            }
        }
    };
}

rdata_kinds! {
    A => as_a,
    NS => as_ns,
    CNAME => as_cname,
    SOA => as_soa,
    MX => as_mx,
    TXT => as_txt,
    AAAA => as_aaaa,
}

/// Reads a `<character-string>`: a length byte followed by that many arbitrary octets.
///
/// Returns the octets and the number of bytes read, including the length byte.
pub fn parse_string(msg: &mut Cursor<&[u8]>) -> Result<(Vec<u8>, usize), ParseError> {
    let len = msg.read_u8()? as usize;
    let mut raw = vec![0; len];
    msg.read_exact(&mut raw)?;
    Ok((raw, len + 1))
}

/// Writes `octets` as a `<character-string>`. Fails for more than 255 octets.
pub fn encode_string_into(octets: &[u8], buf: &mut impl Write) -> Result<(), EncodeError> {
    let len = u8::try_from(octets.len()).map_err(|_| EncodeError::StringTooLong(octets.len()))?;
    buf.write_all(&[len])?;
    buf.write_all(octets)?;
    Ok(())
}

/// Writes `octets` in the quoted zone file form: `"` and `\` are escaped with a backslash, and
/// octets outside printable ASCII are written as `\DDD` (three decimal digits).
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, octets: &[u8]) -> fmt::Result {
    f.write_str("\"")?;
    for &octet in octets {
        match octet {
            b'"' | b'\\' => write!(f, "\\{}", octet as char)?,
            0x20..=0x7e => write!(f, "{}", octet as char)?,
            _ => write!(f, "\\{:03}", octet)?,
        }
    }
    f.write_str("\"")
}
