//! The one seam between the check and the network.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dnscheck_proto::error::{EncodeError, ParseError};
use dnscheck_proto::{HeaderFlags, Message, Name, Opcode, RecordType};
use log::debug;

use crate::net::{send_query_tcp, send_query_udp, Nameserver};
use crate::ConnectionType;

/// Default time to wait for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the query sent for every lookup: one question of class `IN`, recursion desired.
pub fn query_message(name: &Name, qtype: RecordType) -> Result<Message, EncodeError> {
    let flags = HeaderFlags {
        aa: false,
        tc: false,
        rd: true,
        ra: false,
        ad: false,
        cd: false,
    };
    Message::new_query(name.clone(), qtype, Opcode::QUERY, flags)
}

/// Sends a query to a nameserver and returns its response.
///
/// An `Err` means that no usable response arrived. A response with an error rcode is still an
/// `Ok`; what it means is up to the caller.
pub trait Transport {
    fn exchange(&mut self, query: &Message, nameserver: &Nameserver) -> Result<Message>;

    /// Asks `nameserver` for the `qtype` records of `name`.
    fn query(
        &mut self,
        name: &Name,
        qtype: RecordType,
        nameserver: &Nameserver,
    ) -> Result<Message> {
        let query = query_message(name, qtype).context("Could not build query.")?;
        self.exchange(&query, nameserver)
    }
}

/// Talks to real nameservers over the network.
#[derive(Clone, Debug)]
pub struct NetworkTransport {
    pub connection_type: ConnectionType,
    pub timeout: Duration,
}

impl NetworkTransport {
    pub fn new(connection_type: ConnectionType, timeout: Duration) -> Self {
        Self {
            connection_type,
            timeout,
        }
    }

    fn exchange_tcp(&self, nameserver: &mut Nameserver, data: &[u8]) -> Result<Message> {
        let (answer, elapsed) = send_query_tcp(nameserver, data, self.timeout)?;
        debug!(
            "{} bytes via TCP from {} in {} ms",
            answer.len(),
            nameserver,
            elapsed.as_millis()
        );
        Message::parse(&mut Cursor::new(&answer)).context("Could not parse answer.")
    }
}

impl Default for NetworkTransport {
    fn default() -> Self {
        Self::new(ConnectionType::Udp, DEFAULT_TIMEOUT)
    }
}

impl Transport for NetworkTransport {
    fn exchange(&mut self, query: &Message, nameserver: &Nameserver) -> Result<Message> {
        let data = query.encode().context("Could not encode query.")?;
        let mut nameserver = nameserver.clone();

        let answer = match self.connection_type {
            ConnectionType::Tcp => self.exchange_tcp(&mut nameserver, &data)?,
            ConnectionType::Udp => {
                let (answer, elapsed) = send_query_udp(&mut nameserver, &data, self.timeout)?;
                debug!(
                    "{} bytes via UDP from {} in {} ms",
                    answer.len(),
                    nameserver,
                    elapsed.as_millis()
                );
                match Message::parse(&mut Cursor::new(&answer)) {
                    Err(ParseError::TruncatedMessage) => {
                        debug!("Answer from {} was truncated, retrying via TCP.", nameserver);
                        self.exchange_tcp(&mut nameserver, &data)?
                    }
                    res => res.context("Could not parse answer.")?,
                }
            }
        };

        check_reply(query, &answer, &nameserver)?;
        Ok(answer)
    }
}

/// Makes sure `reply` actually answers `query`.
fn check_reply(query: &Message, reply: &Message, nameserver: &Nameserver) -> Result<()> {
    if !reply.header.qr {
        bail!("{} sent a query instead of a response.", nameserver);
    }
    if reply.header.msg_id != query.header.msg_id {
        bail!(
            "{} answered with message id {}, expected {}.",
            nameserver,
            reply.header.msg_id,
            query.header.msg_id
        );
    }
    Ok(())
}

/// An in-memory [`Transport`] that answers from a script, for testing the check without a
/// network.
#[cfg(test)]
pub(crate) mod mock {
    use std::net::Ipv4Addr;

    use anyhow::{anyhow, Result};
    use dnscheck_proto::rdata::{A, CNAME, NS, SOA};
    use dnscheck_proto::{HeaderFlags, Message, Name, RCode, Record, RecordType};

    use super::Transport;
    use crate::net::Nameserver;

    pub enum Reply {
        Answer {
            rcode: RCode,
            answers: Vec<Record>,
            authority: Vec<Record>,
        },
        Fail(&'static str),
    }

    struct Entry {
        server: String,
        name: Name,
        qtype: RecordType,
        reply: Reply,
    }

    /// Answers queries from a list of scripted replies, keyed by nameserver (hostname, or IP if
    /// there is no hostname), queried name and type. Panics on unscripted queries.
    #[derive(Default)]
    pub struct ScriptedTransport {
        entries: Vec<Entry>,
        /// Every query made, in order, as (nameserver, name, type).
        pub queries: Vec<(String, Name, RecordType)>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, server: &str, name: &str, qtype: RecordType, reply: Reply) -> Self {
            self.entries.push(Entry {
                server: server.to_string(),
                name: name_of(name),
                qtype,
                reply,
            });
            self
        }

        /// Shorthand for a `NOERROR` reply with the given answer section.
        pub fn answer(
            self,
            server: &str,
            name: &str,
            qtype: RecordType,
            answers: Vec<Record>,
        ) -> Self {
            self.reply(
                server,
                name,
                qtype,
                Reply::Answer {
                    rcode: RCode::NOERROR,
                    answers,
                    authority: Vec::new(),
                },
            )
        }
    }

    impl Transport for ScriptedTransport {
        fn exchange(&mut self, query: &Message, nameserver: &Nameserver) -> Result<Message> {
            let question = &query.questions[0];
            let server = nameserver.key();
            self.queries
                .push((server.clone(), question.qname.clone(), question.qtype));

            let entry = self
                .entries
                .iter()
                .find(|e| {
                    e.server == server && e.name == question.qname && e.qtype == question.qtype
                })
                .unwrap_or_else(|| {
                    panic!(
                        "unscripted query: {} {} @{}",
                        question.qname, question.qtype, server
                    )
                });

            match &entry.reply {
                Reply::Fail(msg) => Err(anyhow!(*msg)),
                Reply::Answer {
                    rcode,
                    answers,
                    authority,
                } => Ok(Message::new_response(
                    query.header.msg_id,
                    query.header.opcode,
                    HeaderFlags {
                        aa: true,
                        tc: false,
                        rd: true,
                        ra: false,
                        ad: false,
                        cd: false,
                    },
                    *rcode,
                    query.questions.clone(),
                    [answers.clone(), authority.clone(), Vec::new()],
                )),
            }
        }
    }

    pub fn name_of(name: &str) -> Name {
        Name::from_ascii(name).unwrap()
    }

    pub fn ns(owner: &str, target: &str) -> Record {
        Record::new(
            name_of(owner),
            3600,
            NS {
                name: name_of(target),
            }
            .into(),
        )
    }

    pub fn a(owner: &str, ttl: u32, address: &str) -> Record {
        let address: Ipv4Addr = address.parse().unwrap();
        Record::new(name_of(owner), ttl, A { address }.into())
    }

    pub fn cname(owner: &str, target: &str) -> Record {
        Record::new(
            name_of(owner),
            300,
            CNAME {
                target: name_of(target),
            }
            .into(),
        )
    }

    pub fn soa(zone: &str) -> Record {
        Record::new(
            name_of(zone),
            900,
            SOA {
                mname: name_of(&format!("ns1.{}", zone.trim_end_matches('.'))),
                rname: name_of(&format!("hostmaster.{}", zone.trim_end_matches('.'))),
                serial: 2024010101,
                refresh: 7200,
                retry: 3600,
                expire: 1209600,
                minimum: 300,
            }
            .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpListener, UdpSocket};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    use dnscheck_proto::{HeaderFlags, Message, Name, Opcode, RCode, Record, RecordType};

    use super::mock::{a, ScriptedTransport};
    use super::{check_reply, query_message, NetworkTransport, Transport};
    use crate::net::Nameserver;
    use crate::ConnectionType;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// A TCP listener and a UDP socket on the same loopback port.
    fn loopback_sockets() -> (TcpListener, UdpSocket) {
        for _ in 0..10 {
            let listener = TcpListener::bind((LOCALHOST, 0)).unwrap();
            let port = listener.local_addr().unwrap().port();
            if let Ok(socket) = UdpSocket::bind((LOCALHOST, port)) {
                return (listener, socket);
            }
        }
        panic!("no free loopback port for both UDP and TCP");
    }

    fn response(query: &Message, msg_id: u16, flags: HeaderFlags, answers: Vec<Record>) -> Message {
        Message::new_response(
            msg_id,
            Opcode::QUERY,
            flags,
            RCode::NOERROR,
            query.questions.clone(),
            [answers, Vec::new(), Vec::new()],
        )
    }

    /// Answers one UDP query with an empty, truncated response.
    fn serve_truncated_udp(socket: UdpSocket) -> JoinHandle<()> {
        thread::spawn(move || {
            let mut buf = vec![0; 512];
            let (len, peer) = socket.recv_from(&mut buf).unwrap();
            let query = Message::parse(&mut Cursor::new(&buf[..len])).unwrap();
            let flags = HeaderFlags {
                tc: true,
                ..query.header.flags
            };
            let reply = response(&query, query.header.msg_id, flags, Vec::new());
            socket.send_to(&reply.encode().unwrap(), peer).unwrap();
        })
    }

    /// Answers one TCP query with an A record, using `msg_id` to pick the reply's message id.
    fn serve_tcp(listener: TcpListener, msg_id: fn(u16) -> u16) -> JoinHandle<()> {
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut len = [0; 2];
            stream.read_exact(&mut len).unwrap();
            let mut buf = vec![0; u16::from_be_bytes(len) as usize];
            stream.read_exact(&mut buf).unwrap();
            let query = Message::parse(&mut Cursor::new(&buf[..])).unwrap();

            let answer = a("example.com", 300, "192.0.2.1");
            let id = msg_id(query.header.msg_id);
            let reply = response(&query, id, query.header.flags, vec![answer]);
            let data = reply.encode().unwrap();
            stream.write_all(&(data.len() as u16).to_be_bytes()).unwrap();
            stream.write_all(&data).unwrap();
        })
    }

    #[test]
    fn queries_ask_for_recursion() {
        let name = Name::from_ascii("example.com").unwrap();
        let query = query_message(&name, RecordType::NS).unwrap();
        assert!(query.header.flags.rd);
        assert!(!query.header.qr);
        assert_eq!(query.questions.len(), 1);
        assert_eq!(query.questions[0].qname, name);
        assert_eq!(query.questions[0].qtype, RecordType::NS);
    }

    #[test]
    fn reply_must_match_query() {
        let ns = Nameserver::from_hostname("ns1.example.com", 53);
        let query =
            query_message(&Name::from_ascii("example.com").unwrap(), RecordType::A).unwrap();
        let reply = |msg_id| {
            Message::new_response(
                msg_id,
                Opcode::QUERY,
                query.header.flags,
                RCode::NOERROR,
                query.questions.clone(),
                [Vec::new(), Vec::new(), Vec::new()],
            )
        };

        assert!(check_reply(&query, &reply(query.header.msg_id), &ns).is_ok());
        assert!(check_reply(&query, &reply(query.header.msg_id.wrapping_add(1)), &ns).is_err());
        // the query itself is not a response
        assert!(check_reply(&query, &query, &ns).is_err());
    }

    #[test]
    fn scripted_transport_answers_with_query_id() {
        let mut transport = ScriptedTransport::new().answer(
            "ns1.example.com",
            "example.com",
            RecordType::A,
            vec![a("example.com", 300, "192.0.2.1")],
        );
        let ns = Nameserver::from_hostname("ns1.example.com", 53);
        let query =
            query_message(&Name::from_ascii("example.com").unwrap(), RecordType::A).unwrap();
        let reply = transport.exchange(&query, &ns).unwrap();
        assert!(check_reply(&query, &reply, &ns).is_ok());
        assert_eq!(reply.answers.len(), 1);
        assert_eq!(transport.queries.len(), 1);
    }

    #[test]
    fn truncated_udp_answer_is_retried_via_tcp() {
        let (listener, socket) = loopback_sockets();
        let port = socket.local_addr().unwrap().port();
        let udp = serve_truncated_udp(socket);
        let tcp = serve_tcp(listener, |id| id);

        let query =
            query_message(&Name::from_ascii("example.com").unwrap(), RecordType::A).unwrap();
        let mut transport = NetworkTransport::new(ConnectionType::Udp, Duration::from_secs(2));
        let reply = transport
            .exchange(&query, &Nameserver::from_ip(LOCALHOST, port))
            .unwrap();
        udp.join().unwrap();
        tcp.join().unwrap();

        // only the TCP server sends an answer record
        assert!(!reply.header.flags.tc);
        assert_eq!(reply.answers, vec![a("example.com", 300, "192.0.2.1")]);
        assert_eq!(reply.header.msg_id, query.header.msg_id);
    }

    #[test]
    fn tcp_answer_with_wrong_id_is_an_error() {
        let listener = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let tcp = serve_tcp(listener, |id| id.wrapping_add(1));

        let query =
            query_message(&Name::from_ascii("example.com").unwrap(), RecordType::A).unwrap();
        let mut transport = NetworkTransport::new(ConnectionType::Tcp, Duration::from_secs(2));
        let res = transport.exchange(&query, &Nameserver::from_ip(LOCALHOST, port));
        tcp.join().unwrap();

        let err = res.unwrap_err();
        assert!(err.to_string().contains("message id"), "{}", err);
    }
}
