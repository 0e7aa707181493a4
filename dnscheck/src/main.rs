use std::io::Write;

use anyhow::{Context, Result};
use dnscheck::config::ResolverConfig;
use dnscheck::report;
use dnscheck::trace::Trace;
use dnscheck::transport::NetworkTransport;
use dnscheck::{run_check, CheckReport};
use log::LevelFilter;

mod args;

use args::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level)?;

    // an explicit resolver makes /etc/resolv.conf irrelevant
    let config = match args.resolver {
        Some(_) => ResolverConfig::default(),
        None => ResolverConfig::from_system()?,
    }
    .with_override(args.resolver, args.port);

    let mut transport = NetworkTransport::new(args.connection_type, args.timeout);
    let mut trace = Trace::new();
    let res = run_check(&args.host, args.qtype, &config, &mut transport, &mut trace);
    // log what happened before reporting a possible error
    trace.emit();
    let report = res?;

    display_report(&report, &args)?;
    report.verdict()?;

    Ok(())
}

/// Logs to stderr. `RUST_LOG` takes precedence over the level chosen on the command line.
fn init_logger(level: LevelFilter) -> Result<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .try_init()
        .context("Could not initialize logger.")
}

fn display_report(report: &CheckReport, args: &Args) -> Result<()> {
    #[cfg(feature = "json")]
    if args.json {
        println!(
            "{}",
            report::as_json(report).context("Could not serialize report.")?
        );
        return Ok(());
    }
    #[cfg(not(feature = "json"))]
    let _ = args;

    print!(
        "{}",
        report::as_table(report, Some(owo_colors::Stream::Stdout))
    );
    Ok(())
}
