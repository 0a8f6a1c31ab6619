// # cfsync - Cloudflare DNS client
//
// This binary is a THIN integration layer:
// 1. Parse arguments (flags, environment, config file)
// 2. Initialize logging and the runtime
// 3. Build the transport, zone-map store and engine
// 4. Run one command and print its result
//
// All DNS logic lives in cfsync-core.
//
// ## Configuration
//
// Precedence: command-line flag, then environment variable, then the
// `KEY=VALUE` config file (`--config`, default `config.txt`).
//
// - `CFSYNC_API_TOKEN` / `API_TOKEN`: API token (required)
// - `CFSYNC_API_BASE` / `API_BASE`: API base URL
// - `CFSYNC_ZONE_MAP` / `ZONE_MAP`: zone-map file (default `zone_map.txt`)
// - `CFSYNC_DRY_RUN`: look but do not touch
// - `CFSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export CFSYNC_API_TOKEN=...
//
// cfsync list_zones
// cfsync add_update_record 023e105f4ecef8ad9ca31a8372d0c353 A www.example.com 203.0.113.10 1 true
// cfsync --json list_records 023e105f4ecef8ad9ca31a8372d0c353 --type A | jq .
// ```

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

use cfsync_core::config::{ConfigOverrides, DEFAULT_CONFIG_PATH};

/// Exit codes
///
/// - 0: Success
/// - 1: Configuration or usage error
/// - 2: Operation failed (or only partly succeeded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CfsyncExitCode {
    Success = 0,
    ConfigError = 1,
    OperationFailed = 2,
}

impl From<CfsyncExitCode> for ExitCode {
    fn from(code: CfsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "cfsync")]
#[command(about = "Keep Cloudflare DNS records and a local zone map in sync", long_about = None)]
#[command(version)]
struct Cli {
    /// KEY=VALUE credentials file
    #[arg(long, env = "CFSYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Cloudflare API token
    #[arg(long, env = "CFSYNC_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// API base URL
    #[arg(long, env = "CFSYNC_API_BASE", global = true)]
    api_base: Option<String>,

    /// Zone-map cache file
    #[arg(long, env = "CFSYNC_ZONE_MAP", global = true)]
    zone_map: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, env = "CFSYNC_TIMEOUT", global = true)]
    timeout: Option<u64>,

    /// Keep the zone map in memory only
    #[arg(long, global = true)]
    no_cache: bool,

    /// Read from the provider but never change anything
    #[arg(long, env = "CFSYNC_DRY_RUN", global = true)]
    dry_run: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Log level
    #[arg(
        long,
        env = "CFSYNC_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        global = true
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
#[command(rename_all = "snake_case")]
pub(crate) enum Command {
    /// List zones and cache one entry per zone
    ListZones,

    /// Make exactly one record with this content exist
    AddUpdateRecord {
        zone_id: String,

        /// Record type (A, AAAA, CNAME, ...)
        #[arg(value_name = "TYPE")]
        record_type: String,

        /// Fully qualified record name
        name: String,

        content: String,

        /// TTL in seconds, 1 for automatic
        ttl: u32,

        /// true, false, 1 or 0
        #[arg(action = ArgAction::Set, value_parser = parse_proxied)]
        proxied: bool,
    },

    /// Delete one record by ID
    DeleteRecord { zone_id: String, record_id: String },

    /// Purge the edge cache of a zone
    PurgeCache { zone_id: String },

    /// Show what the local zone map knows about a domain
    DisplayRecord { domain: String },

    /// Rebuild the zone map from every zone in the account
    Discover,

    /// List records in a zone
    ListRecords {
        zone_id: String,

        #[arg(long = "type", value_name = "TYPE")]
        record_type: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },
}

fn parse_proxied(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("expected true, false, 1 or 0, got '{}'", other)),
    }
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_token: self.api_token.clone(),
            api_base: self.api_base.clone(),
            zone_map_path: self.zone_map.clone(),
            timeout_secs: self.timeout,
            dry_run: self.dry_run,
            no_cache: self.no_cache,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not errors
            let code = if e.use_stderr() {
                CfsyncExitCode::ConfigError
            } else {
                CfsyncExitCode::Success
            };
            let _ = e.print();
            return code.into();
        }
    };

    // Logs go to stderr so stdout stays clean for --json
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfsyncExitCode::ConfigError.into();
    }

    let config = match commands::load_config(&cli.config, cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return CfsyncExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfsyncExitCode::OperationFailed.into();
        }
    };

    let output = commands::Output::new(cli.json);
    let result = rt.block_on(commands::run(&cli.command, config, &output));

    match result {
        Ok(commands::Completion::Complete) => CfsyncExitCode::Success,
        Ok(commands::Completion::Partial) => CfsyncExitCode::OperationFailed,
        Err(e) => {
            error!("{:#}", e);
            commands::exit_code_for(&e)
        }
    }
    .into()
}
