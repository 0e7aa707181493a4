//! CLI argument definition and parsing.

use std::env;
use std::net::IpAddr;
use std::process;
use std::time::Duration;

use dnscheck::transport::DEFAULT_TIMEOUT;
use dnscheck::ConnectionType;
use dnscheck_proto::{Name, RecordType};
use log::LevelFilter;
use owo_colors::OwoColorize;

const HOST_VAR: &str = "DNSCHECK_HOST";
const TYPE_VAR: &str = "DNSCHECK_TYPE";
const DEFAULT_QTYPE: RecordType = RecordType::A;

#[derive(Clone, Debug, PartialEq)]
pub struct Args {
    pub host: Name,
    pub qtype: RecordType,
    pub resolver: Option<IpAddr>,
    pub port: Option<u16>,
    pub connection_type: ConnectionType,
    #[cfg(feature = "json")]
    pub json: bool,
    pub log_level: LevelFilter,
    pub timeout: Duration,
}

/// What the command line asks for.
#[derive(Debug, PartialEq)]
pub enum Parsed {
    Run(Args),
    Help,
    Version,
}

enum ConsumeNext {
    Host,
    Type,
    Port,
    Timeout,
}

impl Args {
    /// Parses the process's arguments. Prints help or version and exits if asked to, and exits
    /// with an error message on invalid arguments.
    pub fn parse() -> Self {
        // skip executable name
        match Self::parse_from(env::args().skip(1), |var| env::var(var).ok()) {
            Ok(Parsed::Run(args)) => args,
            Ok(Parsed::Help) => {
                print_help();
                process::exit(0)
            }
            Ok(Parsed::Version) => {
                print_version();
                process::exit(0)
            }
            Err(msg) => err(msg),
        }
    }

    /// Parses `args` (without the executable name), falling back to `var` for the environment
    /// variables that can replace `--host` and `--type`.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, String> {
        let args: Vec<String> = args.into_iter().collect();
        if args.is_empty() {
            return Ok(Parsed::Help);
        }

        let mut command_seen = false;
        let mut host = None;
        let mut qtype = None;
        let mut resolver = None;
        let mut port = None;
        let mut connection_type = ConnectionType::Udp;
        #[cfg(feature = "json")]
        let mut json = false;
        let mut log_level = LevelFilter::Info;
        let mut timeout = DEFAULT_TIMEOUT;

        let mut consume_next = None;

        for arg in args {
            if let Some(to_consume) = consume_next.take() {
                match to_consume {
                    ConsumeNext::Host => host = Some(arg),
                    ConsumeNext::Type => qtype = Some(arg),
                    ConsumeNext::Port => port = Some(parse_port(&arg)?),
                    ConsumeNext::Timeout => timeout = parse_timeout(&arg)?,
                }
            } else if let Some(server) = arg.strip_prefix('@') {
                // resolver
                match server.parse::<IpAddr>() {
                    Ok(ip) => resolver = Some(ip),
                    Err(_) => return Err(format!("Invalid resolver IP address: {}.", server)),
                }
            } else if let Some(flag) = arg.strip_prefix('+') {
                // flags
                match flag {
                    "tcp" => {
                        connection_type = ConnectionType::Tcp;
                    }
                    #[cfg(feature = "json")]
                    "json" => {
                        json = true;
                    }
                    x => {
                        return Err(format!("Invalid flag: +{}.", x));
                    }
                }
            } else if let Some(option) = arg.strip_prefix('-') {
                // options, long ones may carry their value after a '='
                let (option, value) = match option.split_once('=') {
                    Some((option, value)) if option.starts_with('-') => (option, Some(value)),
                    _ => (option, None),
                };
                let next = match option {
                    "h" | "-help" => return Ok(Parsed::Help),
                    "V" | "-version" => return Ok(Parsed::Version),
                    "v" | "-verbose" => {
                        log_level = LevelFilter::Debug;
                        None
                    }
                    "q" | "-quiet" => {
                        log_level = LevelFilter::Warn;
                        None
                    }
                    "-host" => Some(ConsumeNext::Host),
                    "t" | "-type" => Some(ConsumeNext::Type),
                    "p" | "-port" => Some(ConsumeNext::Port),
                    "-timeout" => Some(ConsumeNext::Timeout),
                    x => {
                        return Err(format!("Invalid option: -{}.", x));
                    }
                };
                match (next, value) {
                    (Some(ConsumeNext::Host), Some(value)) => host = Some(value.to_string()),
                    (Some(ConsumeNext::Type), Some(value)) => qtype = Some(value.to_string()),
                    (Some(ConsumeNext::Port), Some(value)) => port = Some(parse_port(value)?),
                    (Some(ConsumeNext::Timeout), Some(value)) => timeout = parse_timeout(value)?,
                    (None, Some(_)) => return Err(format!("Option -{} takes no value.", option)),
                    (next, None) => consume_next = next,
                }
            } else if !command_seen {
                match arg.as_str() {
                    "check" | "c" => command_seen = true,
                    x => return Err(format!("Invalid command: {}.", x)),
                }
            } else if host.is_none() {
                host = Some(arg);
            } else {
                return Err(format!("Unexpected argument: {}.", arg));
            }
        }

        if consume_next.is_some() {
            return Err("Missing value for the last option.".to_string());
        }
        if !command_seen {
            return Err("Missing command: expected `check`.".to_string());
        }

        let host = match host.or_else(|| var(HOST_VAR)) {
            Some(host) => host,
            None => return Err(format!("Missing host: use --host or set {}.", HOST_VAR)),
        };
        let host = Name::from_ascii(&host).map_err(|e| e.to_string())?;
        if host.is_root() {
            return Err("The host must not be the DNS root.".to_string());
        }

        let qtype = match qtype.or_else(|| var(TYPE_VAR)) {
            Some(qtype) => RecordType::from_mnemonic(&qtype).map_err(|e| e.to_string())?,
            None => DEFAULT_QTYPE,
        };

        Ok(Parsed::Run(Self {
            host,
            qtype,
            resolver,
            port,
            connection_type,
            #[cfg(feature = "json")]
            json,
            log_level,
            timeout,
        }))
    }
}

fn parse_port(arg: &str) -> Result<u16, String> {
    arg.parse::<u16>().map_err(|_| format!("Invalid port: {}.", arg))
}

fn parse_timeout(arg: &str) -> Result<Duration, String> {
    match arg.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(format!("Invalid timeout: {}.", arg)),
    }
}

macro_rules! var {
    ($var:expr) => {
        $var.if_supports_color(owo_colors::Stream::Stdout, |s| s.green())
    };
}

macro_rules! printopt {
    ($opt:expr, $desc:expr) => {
        println!(
            "\t    {:<26} ({})",
            $opt.if_supports_color(owo_colors::Stream::Stdout, |s| s.yellow()),
            $desc,
        )
    };
}

fn print_help() {
    let output = owo_colors::Stream::Stdout;
    print!("{}", "Usage:".if_supports_color(output, |s| s.purple()));
    println!(
        "\tdnscheck check --host {} [--type {}] [@{}] [{}] [{}]",
        var!("host"),
        var!("q-type"),
        var!("resolver"),
        var!("options"),
        var!("flags")
    );
    println!();

    println!("{}", "Where:".if_supports_color(output, |s| s.purple()));

    println!(
        "\t{} is the domain whose nameservers are checked (env: {})",
        var!("host"),
        HOST_VAR
    );
    println!();

    println!(
        "\t{} is the record type every nameserver must answer with (default: {}, env: {})",
        var!("q-type"),
        DEFAULT_QTYPE,
        TYPE_VAR
    );
    println!();

    println!(
        "\t{} is the IP address of the resolver used to find the nameservers",
        var!("resolver")
    );
    println!("\t(default: the first nameserver in /etc/resolv.conf)");
    println!();

    println!("\t{} is one or more of the following:", var!("options"));
    printopt!("-h | --help", "print this help message");
    printopt!("-V | --version", "print the version of dnscheck");
    printopt!("-v | --verbose", "log every query");
    printopt!("-q | --quiet", "only log warnings and errors");
    printopt!("-p | --port <port>", "use the given resolver port");
    printopt!("--timeout <seconds>", "wait this long for each reply");
    println!();
    println!("\t{} is one or more of the following:", var!("flags"));
    printopt!("+tcp", "use TCP instead of UDP");
    #[cfg(feature = "json")]
    printopt!("+json", "print the report as JSON");
    println!();

    println!(
        "The command may be abbreviated as `{}`.",
        "c".if_supports_color(output, |s| s.green())
    );
    println!(
        "Logs are written to stderr and can be filtered with {}.",
        var!("RUST_LOG")
    );
    println!();

    println!(
        "Output is colourized by default. This can be tuned using the {}/{} environment variables.",
        var!("FORCE_COLOR"),
        var!("NO_COLOR")
    );
}

fn print_version() {
    println!("dnscheck v{}", env!("CARGO_PKG_VERSION"));
}

fn err(msg: impl AsRef<str>) -> ! {
    eprintln!("{}", msg.as_ref());
    process::exit(1)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use dnscheck::ConnectionType;
    use dnscheck_proto::{Name, RecordType};
    use log::LevelFilter;

    use super::{Args, Parsed};

    fn parse(args: &[&str]) -> Result<Parsed, String> {
        Args::parse_from(args.iter().map(|s| s.to_string()), |_| None)
    }

    fn run(args: &[&str]) -> Args {
        match parse(args) {
            Ok(Parsed::Run(args)) => args,
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn defaults() {
        let args = run(&["check", "--host", "example.com"]);
        assert_eq!(args.host, Name::from_ascii("example.com").unwrap());
        assert_eq!(args.qtype, RecordType::A);
        assert_eq!(args.resolver, None);
        assert_eq!(args.port, None);
        assert_eq!(args.connection_type, ConnectionType::Udp);
        assert_eq!(args.log_level, LevelFilter::Info);
        assert_eq!(args.timeout, Duration::from_secs(5));
    }

    #[test]
    fn everything() {
        let args = run(&[
            "c",
            "--host=www.example.com.",
            "--type",
            "aaaa",
            "@127.0.0.1",
            "-p",
            "5353",
            "+tcp",
            "-v",
            "--timeout",
            "2",
        ]);
        assert_eq!(args.host, Name::from_ascii("www.example.com").unwrap());
        assert_eq!(args.qtype, RecordType::AAAA);
        assert_eq!(args.resolver, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(args.port, Some(5353));
        assert_eq!(args.connection_type, ConnectionType::Tcp);
        assert_eq!(args.log_level, LevelFilter::Debug);
        assert_eq!(args.timeout, Duration::from_secs(2));
    }

    #[test]
    fn host_may_be_positional() {
        let args = run(&["check", "example.org", "-q"]);
        assert_eq!(args.host, Name::from_ascii("example.org").unwrap());
        assert_eq!(args.log_level, LevelFilter::Warn);
    }

    #[test]
    fn environment_fills_in_missing_values() {
        let env = |var: &str| match var {
            "DNSCHECK_HOST" => Some("env.example.com".to_string()),
            "DNSCHECK_TYPE" => Some("MX".to_string()),
            _ => None,
        };
        let parsed = Args::parse_from(vec!["check".to_string()], env);
        match parsed {
            Ok(Parsed::Run(args)) => {
                assert_eq!(args.host, Name::from_ascii("env.example.com").unwrap());
                assert_eq!(args.qtype, RecordType::MX);
            }
            other => panic!("unexpected parse result: {:?}", other),
        }

        // flags win over the environment
        let parsed = Args::parse_from(
            ["check", "--host", "flag.example.com"].map(String::from),
            env,
        );
        match parsed {
            Ok(Parsed::Run(args)) => {
                assert_eq!(args.host, Name::from_ascii("flag.example.com").unwrap())
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn help_and_version() {
        assert_eq!(parse(&[]), Ok(Parsed::Help));
        assert_eq!(parse(&["check", "-h"]), Ok(Parsed::Help));
        assert_eq!(parse(&["--version"]), Ok(Parsed::Version));
    }

    #[test]
    fn invalid_arguments() {
        assert!(parse(&["check"]).is_err());
        assert!(parse(&["--host", "example.com"]).is_err());
        assert!(parse(&["lookup", "--host", "example.com"]).is_err());
        assert!(parse(&["check", "--host", "exa mple.com"]).is_err());
        assert!(parse(&["check", "--host", "."]).is_err());
        assert!(parse(&["check", "--host", "example.com", "--type", "BOGUS"]).is_err());
        assert!(parse(&["check", "--host", "example.com", "@ns1.example.com"]).is_err());
        assert!(parse(&["check", "--host", "example.com", "-p", "99999"]).is_err());
        assert!(parse(&["check", "--host", "example.com", "--timeout", "0"]).is_err());
        assert!(parse(&["check", "--host", "example.com", "+dnssec"]).is_err());
        assert!(parse(&["check", "--host"]).is_err());
        assert!(parse(&["check", "example.com", "example.org"]).is_err());
    }
}
