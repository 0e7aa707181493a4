//! Sockets: one query out, one answer back, over UDP or TCP.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{
    IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket,
};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use byteorder::{NetworkEndian, WriteBytesExt};

/// Largest DNS message that fits into a UDP datagram or a TCP length prefix.
const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// A server to send queries to, known by IP address, by hostname, or both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nameserver {
    /// If this is [`None`], `ip` must be [`Some`].
    pub hostname: Option<String>,
    /// Filled in with the peer's address once a query went through.
    pub ip: Option<IpAddr>,
    pub port: u16,
}

impl Nameserver {
    pub fn from_ip(ip: IpAddr, port: u16) -> Self {
        Self {
            hostname: None,
            ip: Some(ip),
            port,
        }
    }

    /// A nameserver that is known only by name; its address is looked up when connecting.
    pub fn from_hostname(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: Some(hostname.into()),
            ip: None,
            port,
        }
    }

    /// The name this nameserver is known by: its hostname if there is one, otherwise its IP.
    pub fn key(&self) -> String {
        self.hostname
            .clone()
            .or_else(|| self.ip.map(|ip| ip.to_string()))
            .unwrap_or_default()
    }

    /// The first socket address of the nameserver, looking up the hostname if needed.
    fn socket_addr(&self) -> Result<SocketAddr> {
        match self.to_socket_addrs()?.next() {
            Some(addr) => Ok(addr),
            None => bail!("{} has no address.", self),
        }
    }
}

/// Formats an IP address for use in front of a port. IPv4-mapped IPv6 addresses are shown as
/// IPv4.
fn host_part(ip: IpAddr) -> String {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4() {
            Some(v4) if v4.to_ipv6_mapped() == v6 => v4.to_string(),
            _ => format!("[{}]", v6),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

impl fmt::Display for Nameserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, &self.hostname) {
            (Some(ip), hostname) => {
                write!(f, "{}:{}", host_part(ip), self.port)?;
                if let Some(hostname) = hostname {
                    write!(f, " ({})", hostname)?;
                }
                Ok(())
            }
            (None, Some(hostname)) => write!(f, "{}:{}", hostname, self.port),
            (None, None) => f.write_str("unknown nameserver"),
        }
    }
}

impl ToSocketAddrs for Nameserver {
    type Iter = std::vec::IntoIter<SocketAddr>;

    fn to_socket_addrs(&self) -> io::Result<Self::Iter> {
        match (self.ip, &self.hostname) {
            (Some(ip), _) => Ok(vec![SocketAddr::new(ip, self.port)].into_iter()),
            (None, Some(hostname)) => (hostname.as_str(), self.port).to_socket_addrs(),
            (None, None) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "nameserver has neither IP nor hostname",
            )),
        }
    }
}

/// Sends `data` in a single datagram and waits up to `timeout` for the reply.
///
/// Returns the reply and the round trip time. On success, `nameserver.ip` is set to the address
/// the reply came from.
pub fn send_query_udp(
    nameserver: &mut Nameserver,
    data: &[u8],
    timeout: Duration,
) -> Result<(Vec<u8>, Duration)> {
    let target = nameserver.socket_addr()?;
    // the local address must be of the same family as the target
    let local: IpAddr = match target {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    };
    let socket = UdpSocket::bind((local, 0)).context("Could not create UDP socket.")?;
    socket
        .connect(target)
        .with_context(|| format!("Could not connect to {} via UDP.", nameserver))?;
    socket
        .set_write_timeout(Some(WRITE_TIMEOUT))
        .and_then(|_| socket.set_read_timeout(Some(timeout)))
        .context("Could not set UDP socket timeouts.")?;

    let started = Instant::now();
    socket
        .send(data)
        .with_context(|| format!("Could not send query to {}.", nameserver))?;
    let mut reply = vec![0; MAX_MESSAGE_SIZE];
    let (len, peer) = socket
        .recv_from(&mut reply)
        .with_context(|| format!("{} did not reply in time.", nameserver))?;
    let rtt = started.elapsed();

    reply.truncate(len);
    nameserver.ip = Some(peer.ip());
    Ok((reply, rtt))
}

/// Sends `data` over a fresh TCP connection, prefixed with its length as per
/// [RFC 1035, Section 4.2.2](https://www.rfc-editor.org/rfc/rfc1035#section-4.2.2), and reads one
/// length-prefixed reply.
///
/// Returns the reply and the round trip time. On success, `nameserver.ip` is set to the address
/// of the peer.
pub fn send_query_tcp(
    nameserver: &mut Nameserver,
    data: &[u8],
    timeout: Duration,
) -> Result<(Vec<u8>, Duration)> {
    if data.len() > MAX_MESSAGE_SIZE {
        bail!("Query of {} bytes is too long for TCP.", data.len());
    }
    let mut framed = Vec::with_capacity(data.len() + 2);
    framed.write_u16::<NetworkEndian>(data.len() as u16)?;
    framed.extend_from_slice(data);

    let target = nameserver.socket_addr()?;
    let mut stream = TcpStream::connect_timeout(&target, timeout)
        .with_context(|| format!("Could not connect to {} via TCP.", nameserver))?;
    stream
        .set_write_timeout(Some(WRITE_TIMEOUT))
        .and_then(|_| stream.set_read_timeout(Some(timeout)))
        .context("Could not set TCP stream timeouts.")?;

    let started = Instant::now();
    stream
        .write_all(&framed)
        .with_context(|| format!("Could not send query to {}.", nameserver))?;

    // the server may keep the connection open, so read exactly the announced length
    let mut len = [0; 2];
    let mut reply = Vec::new();
    stream
        .read_exact(&mut len)
        .and_then(|_| {
            reply.resize(u16::from_be_bytes(len) as usize, 0);
            stream.read_exact(&mut reply)
        })
        .with_context(|| format!("{} did not send a complete reply.", nameserver))?;
    let rtt = started.elapsed();
    stream.shutdown(Shutdown::Both).ok();

    nameserver.ip = Some(target.ip());
    Ok((reply, rtt))
}
