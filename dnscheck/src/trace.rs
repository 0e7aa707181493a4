//! Diagnostics collected while a check runs.
//!
//! The check itself never logs. It records [`Event`]s in a [`Trace`] that the caller hands in,
//! and the caller decides what to do with them, e.g. [`Trace::emit()`] them to the [`log`] facade.

use std::fmt::{self, Display};

use dnscheck_proto::{Name, RCode, RecordType};
use log::Level;

/// Something noteworthy that happened during a check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The resolver that NS queries are sent to.
    DiscoveredResolver { resolver: String },
    /// An NS query for `name` is about to be sent.
    ProbingNameservers { name: Name },
    /// The NS answer was empty; its SOA record names the zone that is queried next.
    FoundSoa { zone: Name },
    /// A record in an answer that the check has no use for.
    IgnoredRecord { owner: Name, rtype: RecordType },
    /// The delegation has been resolved.
    FoundNameservers { host: Name, count: usize },
    /// A nameserver is about to be queried directly.
    Verifying {
        nameserver: String,
        name: Name,
        qtype: RecordType,
    },
    /// A nameserver answered with at least one usable record.
    NameserverAnswered { nameserver: String, records: usize },
    /// A nameserver answered, but without a usable record.
    NameserverFailed {
        nameserver: String,
        rcode: RCode,
        answers: usize,
        qtype: RecordType,
    },
}

impl Event {
    /// The log level this event is emitted at.
    pub fn level(&self) -> Level {
        match self {
            Event::IgnoredRecord { .. } | Event::Verifying { .. } => Level::Debug,
            Event::NameserverAnswered { .. } => Level::Debug,
            Event::NameserverFailed { .. } => Level::Warn,
            Event::DiscoveredResolver { .. }
            | Event::ProbingNameservers { .. }
            | Event::FoundSoa { .. }
            | Event::FoundNameservers { .. } => Level::Info,
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::DiscoveredResolver { resolver } => {
                write!(f, "Discovered local resolver: {}", resolver)
            }
            Event::ProbingNameservers { name } => {
                write!(f, "Probing for NS records (nameservers) for {}", name)
            }
            Event::FoundSoa { zone } => write!(f, "Found SOA record: {}", zone),
            Event::IgnoredRecord { owner, rtype } => {
                write!(f, "Ignoring {} record for {}", rtype, owner)
            }
            Event::FoundNameservers { host, count } => {
                write!(f, "Found {} nameservers for {}.", count, host)
            }
            Event::Verifying {
                nameserver,
                name,
                qtype,
            } => write!(f, "Querying {} for {} {}", nameserver, name, qtype),
            Event::NameserverAnswered {
                nameserver,
                records,
            } => write!(f, "{} answered with {} record(s)", nameserver, records),
            Event::NameserverFailed {
                nameserver,
                rcode,
                answers,
                qtype,
            } => write!(
                f,
                "{} answered {} with {} record(s), none of type {}",
                nameserver, rcode, answers, qtype
            ),
        }
    }
}

/// An ordered list of [`Event`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    events: Vec<Event>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Logs and removes all recorded events, in the order they were recorded.
    pub fn emit(&mut self) {
        for event in self.events.drain(..) {
            log::log!(event.level(), "{}", event);
        }
    }
}
