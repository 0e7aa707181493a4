//! `dnscheck` verifies that every authoritative nameserver of a domain answers for it.
//!
//! The check runs in three steps:
//! 1. [`delegation::resolve_nameservers()`] asks the local resolver for the NS records of the
//!    host, falling back to the zone named by the SOA record of a negative answer.
//! 2. [`verify::verify()`] queries every one of those nameservers directly.
//! 3. [`check::run_check()`] drives both and collects one [`check::CheckRow`] per answer into a
//!    [`check::CheckReport`].
//!
//! All network access goes through the [`transport::Transport`] trait, and all diagnostics are
//! collected in a [`trace::Trace`] instead of being logged, so the check itself has no side
//! effects besides the queries it sends.

pub mod check;
pub mod config;
pub mod delegation;
pub mod error;
pub mod net;
pub mod report;
pub mod trace;
pub mod transport;
pub mod verify;

pub use check::{run_check, CheckReport, CheckRow};
pub use error::CheckError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionType {
    /// UDP, retrying over TCP when the answer is truncated.
    Udp,
    Tcp,
}
