//! Finding the authoritative nameservers of a host.

use dnscheck_proto::{Message, Name, RCode, Rdata, RecordType};

use crate::error::CheckError;
use crate::net::Nameserver;
use crate::trace::{Event, Trace};
use crate::transport::Transport;

/// Asks `resolver` for the nameservers of `host`.
///
/// If the NS answer for `host` is empty (e.g. because `host` is not a zone of its own), the first
/// record of the authority section must be an SOA record. Its owner is the zone containing `host`,
/// and the NS query is repeated once for that zone.
///
/// The nameservers are returned in the order of the answer, without removing duplicates. Records
/// of other types in a non-empty answer are skipped, so the list may be empty.
pub fn resolve_nameservers<T: Transport + ?Sized>(
    host: &Name,
    resolver: &Nameserver,
    transport: &mut T,
    trace: &mut Trace,
) -> Result<Vec<Name>, CheckError> {
    let answer = fetch_ns(host, resolver, transport, trace)?;
    if !answer.answers.is_empty() {
        return Ok(collect_nameservers(&answer, trace));
    }

    let zone = match answer.authoritative_answers.first() {
        Some(record) if matches!(record.rdata, Rdata::SOA(_)) => record.owner.clone(),
        _ => return Err(CheckError::NoAuthority(host.clone())),
    };
    trace.push(Event::FoundSoa { zone: zone.clone() });

    let answer = fetch_ns(&zone, resolver, transport, trace)?;
    if answer.answers.is_empty() {
        return Err(CheckError::NoNameservers(zone));
    }
    Ok(collect_nameservers(&answer, trace))
}

/// Sends the NS query for `name` and makes sure it succeeded.
fn fetch_ns<T: Transport + ?Sized>(
    name: &Name,
    resolver: &Nameserver,
    transport: &mut T,
    trace: &mut Trace,
) -> Result<Message, CheckError> {
    trace.push(Event::ProbingNameservers { name: name.clone() });

    let answer = transport
        .query(name, RecordType::NS, resolver)
        .map_err(|e| CheckError::QueryFailed {
            name: name.clone(),
            server: resolver.to_string(),
            source: e.into(),
        })?;

    match answer.rcode() {
        RCode::NOERROR => Ok(answer),
        rcode => Err(CheckError::InvalidNsAnswer {
            name: name.clone(),
            rcode,
        }),
    }
}

/// Picks the NS records out of an answer.
fn collect_nameservers(answer: &Message, trace: &mut Trace) -> Vec<Name> {
    let mut nameservers = Vec::with_capacity(answer.answers.len());
    for record in &answer.answers {
        match &record.rdata {
            Rdata::NS(ns) => nameservers.push(ns.name.clone()),
            _ => trace.push(Event::IgnoredRecord {
                owner: record.owner.clone(),
                rtype: record.rtype,
            }),
        }
    }
    nameservers
}
