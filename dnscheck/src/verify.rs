//! Querying a single nameserver directly.

use dnscheck_proto::{Name, RCode, Record, RecordType};

use crate::check::CheckRow;
use crate::config::DNS_PORT;
use crate::error::CheckError;
use crate::net::Nameserver;
use crate::trace::{Event, Trace};
use crate::transport::Transport;

/// Asks `nameserver` for the `qtype` records of `host` and turns the answer into report rows.
///
/// Every matching record becomes one row. If the nameserver answers with an error rcode or without
/// any matching record, a single failed row is returned instead. Only a failed exchange is an
/// `Err`, as it says nothing about the nameserver's data.
pub fn verify<T: Transport + ?Sized>(
    host: &Name,
    qtype: RecordType,
    nameserver: &Name,
    transport: &mut T,
    trace: &mut Trace,
) -> Result<Vec<CheckRow>, CheckError> {
    let display_name = nameserver.to_string();
    trace.push(Event::Verifying {
        nameserver: display_name.clone(),
        name: host.clone(),
        qtype,
    });

    let server = Nameserver::from_hostname(display_name.clone(), DNS_PORT);
    let answer = transport
        .query(host, qtype, &server)
        .map_err(|e| CheckError::Transport {
            nameserver: display_name.clone(),
            name: host.clone(),
            source: e.into(),
        })?;

    let rows: Vec<_> = if answer.rcode() == RCode::NOERROR {
        answer
            .answers
            .iter()
            .filter(|record| matches_type(record, qtype))
            .map(|record| CheckRow::answered(&display_name, record))
            .collect()
    } else {
        Vec::new()
    };

    if rows.is_empty() {
        trace.push(Event::NameserverFailed {
            nameserver: display_name.clone(),
            rcode: answer.rcode(),
            answers: answer.answers.len(),
            qtype,
        });
        return Ok(vec![CheckRow::failed(display_name)]);
    }

    trace.push(Event::NameserverAnswered {
        nameserver: display_name,
        records: rows.len(),
    });
    Ok(rows)
}

fn matches_type(record: &Record, qtype: RecordType) -> bool {
    // the rdata of unknown types doesn't know its type, the record does
    match qtype {
        RecordType::Unknown(_) => record.rtype == qtype,
        _ => record.rdata.rtype() == qtype,
    }
}

#[cfg(test)]
mod tests {
    use dnscheck_proto::{Name, RCode, RecordType};

    use super::verify;
    use crate::check::CheckRow;
    use crate::error::CheckError;
    use crate::trace::Trace;
    use crate::transport::mock::{a, cname, name_of, Reply, ScriptedTransport};

    const NS1: &str = "ns1.example.com";

    fn run(
        host: &str,
        qtype: RecordType,
        transport: &mut ScriptedTransport,
    ) -> Result<Vec<CheckRow>, CheckError> {
        let nameserver: Name = name_of(NS1);
        verify(&name_of(host), qtype, &nameserver, transport, &mut Trace::new())
    }

    #[test]
    fn one_row_per_record() {
        let mut transport = ScriptedTransport::new().answer(
            NS1,
            "example.com",
            RecordType::A,
            vec![
                a("example.com", 300, "192.0.2.1"),
                a("example.com", 300, "192.0.2.2"),
            ],
        );
        let rows = run("example.com", RecordType::A, &mut transport).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| !row.is_failure()));
        let data: Vec<_> = rows
            .iter()
            .map(|row| row.answer.as_ref().unwrap().data.as_str())
            .collect();
        assert_eq!(data, vec!["192.0.2.1", "192.0.2.2"]);
        assert_eq!(rows[0].nameserver, NS1);
        assert_eq!(rows[0].answer.as_ref().unwrap().ttl, 300);
        assert_eq!(rows[0].answer.as_ref().unwrap().rtype, "A");
    }

    #[test]
    fn empty_answer_is_a_failed_row() {
        let mut transport =
            ScriptedTransport::new().answer(NS1, "example.com", RecordType::A, Vec::new());
        let rows = run("example.com", RecordType::A, &mut transport).unwrap();
        assert_eq!(rows, vec![CheckRow::failed(NS1)]);
    }

    #[test]
    fn error_rcode_is_a_failed_row() {
        for rcode in [RCode::REFUSED, RCode::Unknown(12)] {
            let mut transport = ScriptedTransport::new().reply(
                NS1,
                "example.com",
                RecordType::A,
                Reply::Answer {
                    rcode,
                    // records in an error response are not trusted
                    answers: vec![a("example.com", 300, "192.0.2.1")],
                    authority: Vec::new(),
                },
            );
            let rows = run("example.com", RecordType::A, &mut transport).unwrap();
            assert_eq!(rows, vec![CheckRow::failed(NS1)]);
        }
    }

    #[test]
    fn records_of_other_types_do_not_count() {
        let mut transport = ScriptedTransport::new().answer(
            NS1,
            "www.example.com",
            RecordType::A,
            vec![cname("www.example.com", "example.com")],
        );
        let rows = run("www.example.com", RecordType::A, &mut transport).unwrap();
        assert_eq!(rows, vec![CheckRow::failed(NS1)]);

        let mut transport = ScriptedTransport::new().answer(
            NS1,
            "www.example.com",
            RecordType::CNAME,
            vec![cname("www.example.com", "example.com")],
        );
        let rows = run("www.example.com", RecordType::CNAME, &mut transport).unwrap();
        let answer = rows[0].answer.as_ref().unwrap();
        assert_eq!(answer.rtype, "CNAME");
        assert_eq!(answer.data, "example.com");
    }

    #[test]
    fn transport_failure_aborts() {
        let mut transport = ScriptedTransport::new().reply(
            NS1,
            "example.com",
            RecordType::A,
            Reply::Fail("connection refused"),
        );
        match run("example.com", RecordType::A, &mut transport) {
            Err(CheckError::Transport { nameserver, .. }) => assert_eq!(nameserver, NS1),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
