//! Wire format types for `dnscheck`: messages, records and the pieces they are made of, with
//! decoding from and encoding to the format of [RFC 1035](https://www.rfc-editor.org/rfc/rfc1035).
//!
//! # Example
//! ```rust
//! use std::io::Cursor;
//! use dnscheck_proto::{HeaderFlags, Message, Name, Opcode, RecordType};
//!
//! let flags = HeaderFlags { aa: false, tc: false, rd: true, ra: false, ad: false, cd: false };
//! let query = Message::new_query(
//!     Name::from_ascii("example.com").unwrap(),
//!     RecordType::NS,
//!     Opcode::QUERY,
//!     flags,
//! )
//! .unwrap();
//! let wire = query.encode().unwrap();
//!
//! assert_eq!(Message::parse(&mut Cursor::new(&wire)).unwrap(), query);
//! ```
//!
//! All fields are public. Building structs by hand skips the bookkeeping of the constructors, so
//! the section counts of a hand-made [`Header`] are the caller's responsibility.

use std::fmt::{self, Display};
use std::io::{Cursor, ErrorKind, Write};
use std::str::FromStr;

use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use rand::Rng;
use repr_with_fallback::repr_with_fallback;
#[cfg(feature = "serde")]
use serde::Serialize;
use strum_macros::EnumString;

pub mod error;
pub mod name;
pub mod rdata;

use error::{EncodeError, ParseError};

pub use name::Name;
pub use rdata::Rdata;

/// Declares a closed set of header codes together with their numeric values. Values outside the
/// set fail to parse with the given [`ParseError`] variant.
macro_rules! header_codes {
    (
        $(#[$meta:meta])*
        $code:ident($raw:ty) else $invalid:ident {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[cfg_attr(feature = "serde", derive(Serialize))]
        #[derive(PartialEq, Eq, Copy, Clone, Debug)]
        pub enum $code {
            $($variant,)+
        }

        impl $code {
            /// Returns the numeric value of the code.
            pub fn encode(&self) -> u8 {
                match self {
                    $($code::$variant => $value,)+
                }
            }

            /// Looks up the code with the numeric value `val`.
            pub fn parse(val: $raw) -> Result<$code, ParseError> {
                match val {
                    $($value => Ok($code::$variant),)+
                    other => Err(ParseError::$invalid(other)),
                }
            }
        }

        impl Display for $code {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

header_codes! {
    /// The kind of a message.
    /// ([IANA registry][opcodes])
    ///
    /// [opcodes]: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-5
    Opcode(u8) else InvalidOpcode {
        QUERY = 0,
        IQUERY = 1,
        STATUS = 2,
        NOTIFY = 4,
        UPDATE = 5,
        DSO = 6,
    }
}

repr_with_fallback! {
    /// The outcome of a query, as carried in the four RCODE bits of the header.
    ///
    /// Codes without a variant of their own are kept in [`RCode::Unknown`], so an odd response
    /// code never prevents a message from being parsed. Extended RCODEs need EDNS, which
    /// `dnscheck` never sends, so they cannot occur in its responses.
    #[cfg_attr(feature = "serde", derive(Serialize))]
    #[derive(PartialEq, Eq, Copy, Clone, Debug)]
    pub enum RCode {
        NOERROR = 0,
        FORMERR = 1,
        SERVFAIL = 2,
        NXDOMAIN = 3,
        NOTIMP = 4,
        REFUSED = 5,
        YXDOMAIN = 6,
        YXRRSET = 7,
        NXRRSET = 8,
        NOTAUTH = 9,
        NOTZONE = 10,
        DSOTYPENI = 11,
        Unknown(u16),
    }
}

repr_with_fallback! {
    /// A record TYPE.
    ///
    /// Only the types with a decoder in [`rdata`] have their own variant; every other type code
    /// is kept in [`RecordType::Unknown`].
    #[cfg_attr(feature = "serde", derive(Serialize))]
    #[derive(PartialEq, Eq, Copy, Clone, EnumString, Debug)]
    pub enum RecordType {
        A = 1,
        NS = 2,
        CNAME = 5,
        SOA = 6,
        MX = 15,
        TXT = 16,
        AAAA = 28,
        Unknown(u16),
    }
}

repr_with_fallback! {
    /// A record CLASS. Everything `dnscheck` sends or expects is [`Class::IN`].
    #[cfg_attr(feature = "serde", derive(Serialize))]
    #[derive(PartialEq, Eq, Copy, Clone, Debug)]
    pub enum Class {
        IN = 1,
        CH = 3,
        HS = 4,
        NONE = 254,
        ANY = 255,
        Unknown(u16),
    }
}

/// The single-bit flags of a [`Header`].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct HeaderFlags {
    /// Authoritative answer. Only meaningful in responses.
    pub aa: bool,
    /// The message was truncated to fit the transport.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available. Only meaningful in responses.
    pub ra: bool,
    /// Authentic data. [\[RFC 4035\]](https://www.rfc-editor.org/rfc/rfc4035)
    pub ad: bool,
    /// Checking disabled. [\[RFC 4035\]](https://www.rfc-editor.org/rfc/rfc4035)
    pub cd: bool,
}

/// The fixed twelve bytes at the start of every message.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Header {
    /// Chosen by the client; a response carries the id of the query it answers.
    pub msg_id: u16,
    /// Set in responses.
    pub qr: bool,
    pub opcode: Opcode,
    pub flags: HeaderFlags,
    /// [`None`] for queries.
    pub rcode: Option<RCode>,
    /// Length of the question section.
    pub qdcount: u16,
    /// Length of the answer section.
    pub ancount: u16,
    /// Length of the authority section.
    pub nscount: u16,
    /// Length of the additional section.
    pub arcount: u16,
}

/// An entry of the question section.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Question {
    pub qname: Name,
    pub qtype: RecordType,
    pub qclass: Class,
}

/// A resource record from the answer, authority or additional section.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Record {
    pub owner: Name,
    /// The type as sent on the wire. For decoded RDATA this equals [`Rdata::rtype`].
    pub rtype: RecordType,
    pub class: Class,
    /// How many seconds the record may be cached.
    pub ttl: u32,
    pub rdata: Rdata,
}

/// A complete DNS message.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    /// The answer section.
    pub answers: Vec<Record>,
    /// The authority section. Negative answers put the zone's `SOA` here.
    pub authoritative_answers: Vec<Record>,
    /// The additional section.
    pub additional_answers: Vec<Record>,
}

impl RecordType {
    /// Parses a record type from user input, e.g. a command line flag.
    ///
    /// Mnemonics are accepted in any case, and any type can be given in the generic `TYPE<n>`
    /// notation of [RFC 3597](https://www.rfc-editor.org/rfc/rfc3597).
    ///
    /// # Examples
    /// ```rust
    /// use dnscheck_proto::RecordType;
    ///
    /// assert_eq!(RecordType::from_mnemonic("a").ok(), Some(RecordType::A));
    /// assert_eq!(RecordType::from_mnemonic("Mx").ok(), Some(RecordType::MX));
    /// assert_eq!(RecordType::from_mnemonic("TYPE28").ok(), Some(RecordType::AAAA));
    /// assert_eq!(RecordType::from_mnemonic("type99").ok(), Some(RecordType::Unknown(99)));
    ///
    /// assert!(RecordType::from_mnemonic("unknown").is_err());
    /// assert!(RecordType::from_mnemonic("AXFR2").is_err());
    /// ```
    pub fn from_mnemonic(s: &str) -> Result<Self, ParseError> {
        let upper = s.to_ascii_uppercase();
        if let Some(code) = upper.strip_prefix("TYPE") {
            return code
                .parse::<u16>()
                .map(RecordType::from)
                .map_err(|_| ParseError::InvalidRecordType(s.to_string()));
        }
        match RecordType::from_str(&upper) {
            Ok(RecordType::Unknown(_)) | Err(_) => {
                Err(ParseError::InvalidRecordType(s.to_string()))
            }
            Ok(rtype) => Ok(rtype),
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Unknown(code) => write!(f, "TYPE{}", code),
            known => fmt::Debug::fmt(known, f),
        }
    }
}

impl Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RCode::Unknown(code) => write!(f, "RCODE{}", code),
            known => fmt::Debug::fmt(known, f),
        }
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Unknown(code) => write!(f, "CLASS{}", code),
            known => fmt::Debug::fmt(known, f),
        }
    }
}

/// Bit positions of the flags within the second 16-bit word of the header.
const AA_BIT: u16 = 10;
const TC_BIT: u16 = 9;
const RD_BIT: u16 = 8;
const RA_BIT: u16 = 7;
const AD_BIT: u16 = 5;
const CD_BIT: u16 = 4;

impl HeaderFlags {
    /// Extracts the flags from the second 16-bit word of a header. Other bits are ignored.
    pub fn from_flags(word: u16) -> Self {
        let set = |bit: u16| word & (1 << bit) != 0;
        Self {
            aa: set(AA_BIT),
            tc: set(TC_BIT),
            rd: set(RD_BIT),
            ra: set(RA_BIT),
            ad: set(AD_BIT),
            cd: set(CD_BIT),
        }
    }

    /// The flags as they are placed in the second 16-bit word of a header, all other bits zero.
    pub fn as_flags(&self) -> u16 {
        [
            (self.aa, AA_BIT),
            (self.tc, TC_BIT),
            (self.rd, RD_BIT),
            (self.ra, RA_BIT),
            (self.ad, AD_BIT),
            (self.cd, CD_BIT),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .fold(0, |word, (_, bit)| word | 1 << bit)
    }
}

impl Header {
    /// Builds the header of a response. `counts` holds the lengths of the question, answer,
    /// authority and additional sections, in that order.
    pub fn new_response_header(
        msg_id: u16,
        opcode: Opcode,
        flags: HeaderFlags,
        rcode: RCode,
        counts: [u16; 4],
    ) -> Self {
        let [qdcount, ancount, nscount, arcount] = counts;
        Header {
            msg_id,
            qr: true,
            opcode,
            flags,
            rcode: Some(rcode),
            qdcount,
            ancount,
            nscount,
            arcount,
        }
    }

    /// Builds the header of a query with `qdcount` questions and no records.
    ///
    /// The AA and RA flags are reserved for responses; setting either is an error.
    pub fn new_query_header(
        msg_id: u16,
        opcode: Opcode,
        flags: HeaderFlags,
        qdcount: u16,
    ) -> Result<Self, EncodeError> {
        if flags.aa || flags.ra {
            return Err(EncodeError::AaOrRaInQuery);
        }
        Ok(Header {
            msg_id,
            qr: false,
            opcode,
            flags,
            rcode: None,
            qdcount,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        })
    }

    fn counts(&self) -> [u16; 4] {
        [self.qdcount, self.ancount, self.nscount, self.arcount]
    }

    /// Writes the twelve header bytes.
    pub fn encode_into(&self, buf: &mut impl Write) -> Result<(), EncodeError> {
        let rcode = self.rcode.map_or(0, u16::from);
        let word = u16::from(self.qr) << 15
            | u16::from(self.opcode.encode()) << 11
            | self.flags.as_flags()
            | rcode & 0xf;

        buf.write_u16::<NetworkEndian>(self.msg_id)?;
        buf.write_u16::<NetworkEndian>(word)?;
        for count in self.counts() {
            buf.write_u16::<NetworkEndian>(count)?;
        }
        Ok(())
    }

    /// Reads the twelve header bytes.
    pub fn parse(msg: &mut Cursor<&[u8]>) -> Result<Self, ParseError> {
        let mut words = [0; 6];
        for word in &mut words {
            *word = msg.read_u16::<NetworkEndian>()?;
        }
        let [msg_id, word, qdcount, ancount, nscount, arcount] = words;

        let qr = word >> 15 == 1;
        let opcode = Opcode::parse((word >> 11 & 0xf) as u8)?;
        let rcode = RCode::from(word & 0xf);

        Ok(Header {
            msg_id,
            qr,
            opcode,
            flags: HeaderFlags::from_flags(word),
            rcode: qr.then_some(rcode),
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.qr { "response" } else { "query" };
        write!(f, "DNS {} (id: {}, opcode: {}", kind, self.msg_id, self.opcode)?;
        if let Some(rcode) = self.rcode {
            write!(f, ", rcode: {}", rcode)?;
        }
        write!(f, ")")
    }
}

impl Question {
    pub fn new(qname: Name, qtype: RecordType, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    pub fn encode_into(&self, buf: &mut impl Write) -> Result<(), EncodeError> {
        self.qname.encode_into(buf)?;
        buf.write_u16::<NetworkEndian>(self.qtype.into())?;
        buf.write_u16::<NetworkEndian>(self.qclass.into())?;
        Ok(())
    }

    pub fn parse(msg: &mut Cursor<&[u8]>) -> Result<Self, ParseError> {
        let qname = Name::parse(msg)?;
        let qtype = RecordType::from(msg.read_u16::<NetworkEndian>()?);
        let qclass = Class::from(msg.read_u16::<NetworkEndian>()?);
        Ok(Question::new(qname, qtype, qclass))
    }
}

impl Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

impl Record {
    /// Creates a record of class `IN` whose type is that of `rdata`.
    pub fn new(owner: Name, ttl: u32, rdata: Rdata) -> Self {
        Self {
            owner,
            rtype: rdata.rtype(),
            class: Class::IN,
            ttl,
            rdata,
        }
    }

    pub fn encode_into(&self, buf: &mut impl Write) -> Result<(), EncodeError> {
        let rdata = self.rdata.encode()?;
        self.owner.encode_into(buf)?;
        buf.write_u16::<NetworkEndian>(self.rtype.into())?;
        buf.write_u16::<NetworkEndian>(self.class.into())?;
        buf.write_u32::<NetworkEndian>(self.ttl)?;
        buf.write_u16::<NetworkEndian>(rdata.len() as u16)?;
        buf.write_all(&rdata)?;
        Ok(())
    }

    /// Reads one record. Afterwards the cursor is positioned directly behind its RDATA.
    pub fn parse(msg: &mut Cursor<&[u8]>) -> Result<Self, ParseError> {
        let owner = Name::parse(msg)?;
        let rtype = RecordType::from(msg.read_u16::<NetworkEndian>()?);
        let class = Class::from(msg.read_u16::<NetworkEndian>()?);
        let ttl = msg.read_u32::<NetworkEndian>()?;
        let rdlength = msg.read_u16::<NetworkEndian>()?;

        // decoders may assume that all rdlength bytes are there
        let available = (msg.get_ref().len() as u64).saturating_sub(msg.position());
        if available < rdlength as u64 {
            return Err(ParseError::IoError(ErrorKind::UnexpectedEof.into()));
        }

        let rdata = Rdata::parse(rtype, msg, rdlength)?;
        Ok(Record {
            owner,
            rtype,
            class,
            ttl,
            rdata,
        })
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.owner, self.ttl, self.rtype, self.rdata)
    }
}

impl Message {
    /// Builds a query for `domain` in class `IN` under a random message id.
    ///
    /// Fails if `flags` has AA or RA set.
    pub fn new_query(
        domain: Name,
        qtype: RecordType,
        opcode: Opcode,
        flags: HeaderFlags,
    ) -> Result<Self, EncodeError> {
        let msg_id = rand::thread_rng().gen();
        Ok(Message {
            header: Header::new_query_header(msg_id, opcode, flags, 1)?,
            questions: vec![Question::new(domain, qtype, Class::IN)],
            answers: vec![],
            authoritative_answers: vec![],
            additional_answers: vec![],
        })
    }

    /// Builds a response whose header counts match the given sections. `records` holds the
    /// answer, authority and additional sections, in that order.
    pub fn new_response(
        msg_id: u16,
        opcode: Opcode,
        flags: HeaderFlags,
        rcode: RCode,
        questions: Vec<Question>,
        records: [Vec<Record>; 3],
    ) -> Self {
        let counts = [
            questions.len() as u16,
            records[0].len() as u16,
            records[1].len() as u16,
            records[2].len() as u16,
        ];
        let [answers, authoritative_answers, additional_answers] = records;
        Message {
            header: Header::new_response_header(msg_id, opcode, flags, rcode, counts),
            questions,
            answers,
            authoritative_answers,
            additional_answers,
        }
    }

    /// Returns the response code, or [`RCode::NOERROR`] for queries.
    pub fn rcode(&self) -> RCode {
        self.header.rcode.unwrap_or(RCode::NOERROR)
    }

    fn sections(&self) -> [&Vec<Record>; 3] {
        [
            &self.answers,
            &self.authoritative_answers,
            &self.additional_answers,
        ]
    }

    /// Encodes the message, without name compression.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Like [`encode`](Self::encode), but writes into `buf`.
    pub fn encode_into(&self, buf: &mut impl Write) -> Result<(), EncodeError> {
        self.header.encode_into(buf)?;
        self.questions
            .iter()
            .try_for_each(|question| question.encode_into(buf))?;
        self.sections()
            .into_iter()
            .flatten()
            .try_for_each(|record| record.encode_into(buf))
    }

    /// Decodes a message.
    ///
    /// A set TC flag yields [`ParseError::TruncatedMessage`]: the sections of a truncated message
    /// cannot be trusted to be complete.
    pub fn parse(msg: &mut Cursor<&[u8]>) -> Result<Self, ParseError> {
        let header = Header::parse(msg)?;
        if header.flags.tc {
            return Err(ParseError::TruncatedMessage);
        }

        let questions = (0..header.qdcount)
            .map(|_| Question::parse(msg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut read_section = |count: u16| -> Result<Vec<Record>, ParseError> {
            (0..count).map(|_| Record::parse(msg)).collect()
        };
        let answers = read_section(header.ancount)?;
        let authoritative_answers = read_section(header.nscount)?;
        let additional_answers = read_section(header.arcount)?;

        Ok(Message {
            header,
            questions,
            answers,
            authoritative_answers,
            additional_answers,
        })
    }
}
