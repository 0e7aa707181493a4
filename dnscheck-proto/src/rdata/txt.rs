//! `TXT` RDATA.

use std::fmt::{self, Display};
use std::io::Cursor;

use super::{encode_string_into, parse_string, write_quoted, RdataCodec};
use crate::error::{EncodeError, ParseError};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Free-form data, as one or more character strings of arbitrary octets.
/// [\[RFC 1035\]](https://www.rfc-editor.org/rfc/rfc1035)
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TXT {
    pub text: Vec<Vec<u8>>,
}

impl RdataCodec for TXT {
    fn decode(msg: &mut Cursor<&[u8]>, rdlength: u16) -> Result<Self, ParseError> {
        let mut text = Vec::new();
        let mut remaining = rdlength as usize;
        while remaining > 0 {
            let (s, len) = parse_string(msg)?;
            // a string running past the RDATA is caught by the length check of the caller
            remaining = remaining.saturating_sub(len);
            text.push(s);
        }
        Ok(Self { text })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.text
            .iter()
            .try_for_each(|s| encode_string_into(s, buf))
    }
}

impl Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.text.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write_quoted(f, s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{RdataCodec, TXT};
    use crate::{Message, Rdata};

    #[test]
    fn multiple_strings() {
        let bytes = b"\x05hello\x08\"world\"!";
        let txt = TXT::decode(&mut Cursor::new(&bytes[..]), bytes.len() as u16).unwrap();
        assert_eq!(txt.text, vec![b"hello".to_vec(), b"\"world\"!".to_vec()]);
        assert_eq!(txt.to_string(), r#""hello" "\"world\"!""#);

        let mut encoded = Vec::new();
        txt.encode_into(&mut encoded).unwrap();
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn utf8_answer_is_parsed_and_escaped() {
        // response with one TXT record "aä" for the root
        let bytes: &[u8] = &[
            0x00, 0x01, 0x80, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // header
            0x00, 0x00, 0x10, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05, // root, TXT, IN, ttl 5
            0x00, 0x04, 0x03, b'a', 0xc3, 0xa4,
        ];
        let msg = Message::parse(&mut Cursor::new(bytes)).unwrap();
        let txt = match &msg.answers[0].rdata {
            Rdata::TXT(txt) => txt,
            other => panic!("unexpected rdata: {:?}", other),
        };
        assert_eq!(txt.text, vec!["aä".as_bytes().to_vec()]);
        assert_eq!(txt.to_string(), r#""a\195\164""#);

        let escaped = TXT {
            text: vec![b"back\\slash\x7f".to_vec()],
        };
        assert_eq!(escaped.to_string(), r#""back\\slash\127""#);
    }
}
