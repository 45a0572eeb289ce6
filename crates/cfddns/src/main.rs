// # cfddns - Cloudflare dynamic DNS client
//
// One-shot client: detect (or take) the current address, then point every
// named A/AAAA record in the zone at it. Meant to be run from cron or a
// systemd timer.
//
// This binary is a thin integration layer: it parses arguments, loads
// credentials, sets up logging and hands the work to cfddns-core. All
// reconciliation logic lives in cfddns-core.
//
// ## Credentials
//
// Read from `./cloudflare.env` (or `--credentials <PATH>`), overridden by
// environment variables of the same name:
//
// - `CLOUDFLARE_EMAIL`: Account email
// - `CLOUDFLARE_API_KEY`: API token
// - `CLOUDFLARE_ZONE_ID`: Zone holding the records
//
// ## Example
//
// ```bash
// cfddns -d home.example.com,vpn.example.com
// cfddns -6 -s interface --interface eth0 -d home.example.com
// cfddns -i 203.0.113.7 -p -d www.example.com --dry-run
// ```

mod cli;
mod credentials;
mod exit;
mod logging;

use cfddns_core::{
    AddressSource, AddressSourceConfig, DnsProvider, Error, Reconciler, RunStatus, UpdateRequest,
    config::parse_record_list, resolve_address,
};
use cfddns_provider_cloudflare::CloudflareProvider;
use clap::{CommandFactory, Parser};
use cli::Cli;
use exit::CfddnsExitCode;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info};

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Failed to print help: {}", e);
            return CfddnsExitCode::Unspecified.into();
        }
        return CfddnsExitCode::Success.into();
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = usage_exit_code(&e);
            if let Err(print_err) = e.print() {
                eprintln!("Failed to print usage: {}", print_err);
                return CfddnsExitCode::Unspecified.into();
            }
            return code.into();
        }
    };

    let (level, level_error) = startup_level(&cli, std::env::var(logging::LOG_LEVEL_VAR).ok());

    if let Err(e) = logging::init(&cli.log, level) {
        eprintln!("{:#}", e);
        return CfddnsExitCode::Unspecified.into();
    }

    if let Some(e) = level_error {
        error!("Configuration error: {}", e);
        return CfddnsExitCode::from(&e).into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfddnsExitCode::Unspecified.into();
        }
    };

    let code = rt.block_on(async {
        match execute(&cli).await {
            Ok(status) => CfddnsExitCode::from(status),
            Err(e) => {
                error!("{}", e);
                CfddnsExitCode::from(&e)
            }
        }
    });

    code.into()
}

/// Exit code for a command line clap refused to parse
///
/// `--help` and `--version` arrive here too; they print to stdout and succeed.
fn usage_exit_code(e: &clap::Error) -> CfddnsExitCode {
    if e.use_stderr() {
        CfddnsExitCode::BadArgument
    } else {
        CfddnsExitCode::Success
    }
}

/// Level to start logging at, plus a level error to report once logging runs
///
/// An invalid level falls back to `info` so the error reaches the log file.
fn startup_level(cli: &Cli, env_value: Option<String>) -> (Level, Option<Error>) {
    match log_level(cli, env_value) {
        Ok(level) => (level, None),
        Err(e) => (Level::INFO, Some(e)),
    }
}

/// Pick the log level: `--verbose`, then the environment, then `info`
fn log_level(cli: &Cli, env_value: Option<String>) -> Result<Level, Error> {
    if cli.verbose {
        return Ok(Level::DEBUG);
    }

    match env_value {
        Some(name) => logging::parse_level(&name).ok_or_else(|| {
            Error::config(format!(
                "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                logging::LOG_LEVEL_VAR,
                name
            ))
        }),
        None => Ok(Level::INFO),
    }
}

/// Run one reconciliation pass for the parsed command line
///
/// Configuration is checked completely before any network call.
async fn execute(cli: &Cli) -> cfddns_core::Result<RunStatus> {
    let credentials = credentials::load(cli.credentials.as_deref())?;
    credentials.validate()?;

    let domains = cli
        .domains
        .as_deref()
        .ok_or_else(|| Error::config("No records given, use --domains <LIST>"))?;
    let records = parse_record_list(domains);

    let settings = cli.provider_settings();
    settings.validate()?;

    let version = cli.ip_version();
    let source_config = cli.source_config();
    if let Some(ip) = cli.ip
        && !version.matches(&ip)
    {
        return Err(Error::invalid_input(format!(
            "Address {} is not an {} address",
            ip, version
        )));
    }

    let provider = CloudflareProvider::new(&credentials, &settings)?;
    if provider.is_dry_run() {
        info!("Dry run: records will be looked up but not changed");
    }

    debug!("Address source: {}", source_config.type_name());
    let source = build_source(&source_config, Duration::from_secs(settings.timeout_secs))?;
    let address = resolve_address(source.as_ref(), version, cli.ip).await?;

    if records.is_empty() {
        info!("No records to update");
        return Ok(RunStatus::Success);
    }

    let request = UpdateRequest::new(records, version, address, cli.proxy)?;
    let reconciler = Reconciler::new(Box::new(provider), credentials.zone_id.clone());
    let report = reconciler.reconcile(&request).await?;

    Ok(report.status())
}

fn build_source(
    config: &AddressSourceConfig,
    timeout: Duration,
) -> cfddns_core::Result<Box<dyn AddressSource>> {
    match config {
        AddressSourceConfig::Interface { .. } => cfddns_ip_iface::create(config),
        _ => cfddns_ip_http::create(config, timeout),
    }
}
