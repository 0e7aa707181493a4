//! The error type of the check.

use dnscheck_proto::{Name, RCode};
use thiserror::Error;

/// The underlying cause of a failed exchange with a server.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can make a check fail.
///
/// All variants except [`CheckError::ChecksFailed`] abort the check before a report exists.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("No resolver configured: the list of resolver servers is empty.")]
    Configuration,

    #[error("Could not query {server} for the NS records of {name}.")]
    QueryFailed {
        name: Name,
        server: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid answer to NS query for {name}: {rcode}.")]
    InvalidNsAnswer { name: Name, rcode: RCode },

    #[error("Couldn't find authority for {0}.")]
    NoAuthority(Name),

    #[error("Couldn't find DNS server: {0}.")]
    NoNameservers(Name),

    #[error("Could not query nameserver {nameserver} for {name}.")]
    Transport {
        nameserver: String,
        name: Name,
        #[source]
        source: BoxError,
    },

    /// At least one nameserver answered without a usable record. Only returned after the
    /// complete report has been produced.
    #[error("One or more errors were discovered during this check.")]
    ChecksFailed,
}
