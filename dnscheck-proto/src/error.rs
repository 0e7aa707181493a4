//! Errors of the wire format codec.

use thiserror::Error;

use crate::RecordType;

/// A message could not be decoded.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Opcode {0} is not assigned.")]
    InvalidOpcode(u8),

    #[error("Unknown record type: {0}.")]
    InvalidRecordType(String),

    #[error("Name is {0} bytes long, the limit is 255.")]
    NameTooLong(usize),

    #[error("Label is {0} bytes long, the limit is 63.")]
    LabelTooLong(usize),

    #[error(
        "Name contains a label with characters other than letters, digits, underscores and \
         inner hyphens."
    )]
    NameInvalidChars,

    #[error("Label contains octet {0:#04x}, which has no unambiguous text form.")]
    InvalidLabelOctet(u8),

    #[error("Name contains an empty label.")]
    EmptyLabel,

    #[error("Label type bits {0:#04x} are neither a length nor a compression pointer.")]
    InvalidLabelType(u8),

    #[error("Compression pointers in name form a loop.")]
    CompressionLoop,

    #[error("RDATA of {0} record must be {1} bytes long, not {2}.")]
    InvalidRdataLength(&'static str, u16, u16),

    #[error("RDATA of {0} record should be {1} bytes long, but {2} bytes were decoded.")]
    RdataLengthMismatch(RecordType, u16, u64),

    #[error("Message is truncated (TC bit set).")]
    TruncatedMessage,

    #[error("I/O error: {0}.")]
    IoError(#[from] std::io::Error),
}

/// A message could not be encoded.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Name is {0} bytes long, the limit is 255.")]
    DomainTooLong(usize),

    #[error("Queries must not set the AA or RA flag.")]
    AaOrRaInQuery,

    #[error("Character string is {0} bytes long, the limit is 255.")]
    StringTooLong(usize),

    #[error("I/O error: {0}.")]
    IoError(#[from] std::io::Error),
}
