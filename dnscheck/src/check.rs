//! Running a complete check and collecting its results.

use dnscheck_proto::{Name, Record, RecordType};

use crate::config::ResolverConfig;
use crate::delegation::resolve_nameservers;
use crate::error::CheckError;
use crate::trace::{Event, Trace};
use crate::transport::Transport;
use crate::verify::verify;

#[cfg(feature = "json")]
use serde::Serialize;

/// The part of a [`CheckRow`] that only exists if the nameserver answered.
#[cfg_attr(feature = "json", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAnswer {
    pub ttl: u32,
    /// The record type's mnemonic, e.g. `"A"`.
    pub rtype: String,
    /// The record data in presentation format, e.g. an IP address.
    pub data: String,
}

/// One line of a [`CheckReport`].
#[cfg_attr(feature = "json", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckRow {
    pub nameserver: String,
    /// [`None`] if the nameserver gave no usable answer.
    pub answer: Option<RowAnswer>,
}

impl CheckRow {
    pub fn failed(nameserver: impl Into<String>) -> Self {
        Self {
            nameserver: nameserver.into(),
            answer: None,
        }
    }

    pub fn answered(nameserver: impl Into<String>, record: &Record) -> Self {
        Self {
            nameserver: nameserver.into(),
            answer: Some(RowAnswer {
                ttl: record.ttl,
                rtype: record.rtype.to_string(),
                data: record.rdata.to_string(),
            }),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.answer.is_none()
    }
}

/// The rows of a check, in the order the nameservers were discovered, and whether any of them
/// failed.
#[cfg_attr(feature = "json", derive(Serialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    rows: Vec<CheckRow>,
    failed: bool,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: CheckRow) {
        self.failed |= row.is_failure();
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[CheckRow] {
        &self.rows
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Turns a failed report into [`CheckError::ChecksFailed`]. Meant to be called after the
    /// report has been shown.
    pub fn verdict(&self) -> Result<(), CheckError> {
        if self.failed {
            Err(CheckError::ChecksFailed)
        } else {
            Ok(())
        }
    }
}

/// Checks that every nameserver of `host` has `qtype` records for it.
///
/// Nameservers are looked up via the first resolver in `config`, then queried one after another.
/// A nameserver without a usable answer gets a failed row and the check moves on; an error is only
/// returned if the nameservers could not be found or one of them could not be reached at all.
pub fn run_check<T: Transport + ?Sized>(
    host: &Name,
    qtype: RecordType,
    config: &ResolverConfig,
    transport: &mut T,
    trace: &mut Trace,
) -> Result<CheckReport, CheckError> {
    let resolver = config.endpoint()?;
    trace.push(Event::DiscoveredResolver {
        resolver: resolver.to_string(),
    });

    let nameservers = resolve_nameservers(host, &resolver, transport, trace)?;
    trace.push(Event::FoundNameservers {
        host: host.clone(),
        count: nameservers.len(),
    });

    let mut report = CheckReport::new();
    for nameserver in &nameservers {
        for row in verify(host, qtype, nameserver, transport, trace)? {
            report.push(row);
        }
    }

    Ok(report)
}
