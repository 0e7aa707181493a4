//! The resolver that NS queries are sent to.

use std::fs;
use std::net::IpAddr;

use anyhow::{Context, Result};
use resolv_conf::ScopedIp;

use crate::error::CheckError;
use crate::net::Nameserver;

/// The standard DNS port.
pub const DNS_PORT: u16 = 53;

const RESOLV_CONF: &str = "/etc/resolv.conf";

/// An ordered list of resolver addresses and the port they listen on. Only the first address is
/// ever used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    pub servers: Vec<IpAddr>,
    pub port: u16,
}

impl ResolverConfig {
    /// Reads the system's resolvers from `/etc/resolv.conf`.
    pub fn from_system() -> Result<Self> {
        let contents =
            fs::read(RESOLV_CONF).context(format!("Could not read {}.", RESOLV_CONF))?;
        Self::from_resolv_conf(&contents).context(format!("Could not parse {}.", RESOLV_CONF))
    }

    /// Parses the contents of a `resolv.conf` file. The list may be empty, which is only reported
    /// once the check asks for the [`endpoint()`](Self::endpoint()).
    ///
    /// # Examples
    /// ```rust
    /// use std::net::IpAddr;
    ///
    /// use dnscheck::config::ResolverConfig;
    ///
    /// let config = ResolverConfig::from_resolv_conf(b"nameserver 192.0.2.53\n").unwrap();
    /// assert_eq!(config.servers, vec!["192.0.2.53".parse::<IpAddr>().unwrap()]);
    /// assert_eq!(config.port, 53);
    /// ```
    pub fn from_resolv_conf(contents: &[u8]) -> Result<Self> {
        let conf = resolv_conf::Config::parse(contents).context("Invalid resolv.conf syntax.")?;
        let servers = conf
            .nameservers
            .into_iter()
            .map(|ip| match ip {
                ScopedIp::V4(ip) => IpAddr::V4(ip),
                // the scope (interface) is dropped, sockets are bound without one
                ScopedIp::V6(ip, _) => IpAddr::V6(ip),
            })
            .collect();

        Ok(Self {
            servers,
            port: DNS_PORT,
        })
    }

    /// Replaces the server list with `server` and the port with `port`, each only if given.
    pub fn with_override(mut self, server: Option<IpAddr>, port: Option<u16>) -> Self {
        if let Some(server) = server {
            self.servers = vec![server];
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Returns the first configured server.
    pub fn endpoint(&self) -> Result<Nameserver, CheckError> {
        let ip = self.servers.first().ok_or(CheckError::Configuration)?;
        Ok(Nameserver::from_ip(*ip, self.port))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            port: DNS_PORT,
        }
    }
}
