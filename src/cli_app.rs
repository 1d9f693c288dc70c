//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{ColoredString, Colorize, control};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use usage_gauge::core::config::Config;
use usage_gauge::core::errors::GaugeError;
use usage_gauge::logger::jsonl::{JsonlConfig, JsonlWriter, LogEntry};
use usage_gauge::size::humanize::{HumanizedSize, MAX_PRECISION};
use usage_gauge::size::quantity::ByteQuantity;
use usage_gauge::size::unit::SizeBase;
use usage_gauge::usage::calculator::{UsageAnomaly, UsageCalculator, UsageSnapshot};
use usage_gauge::usage::severity::SeverityTier;

/// ugauge: humanize byte counts and compute device usage.
#[derive(Debug, Parser)]
#[command(
    name = "ugauge",
    author,
    version,
    about = "Humanize byte counts and compute storage usage",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Append activity events as JSONL; `--log=PATH` overrides the configured path.
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true
    )]
    log: Option<Option<PathBuf>>,
    /// Decimal places in display values.
    #[arg(long, global = true, value_name = "N")]
    precision: Option<u8>,
    /// Use binary (KiB, MiB, ...) units.
    #[arg(long, global = true)]
    binary: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Humanize one or more byte counts.
    Humanize(HumanizeArgs),
    /// Compute used space, percentage, and severity for a device.
    Usage(UsageArgs),
    /// View the effective configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct HumanizeArgs {
    /// Byte counts: decimal (`1_500_000`) or big-endian u32 limbs (`2:1410065408`).
    #[arg(value_name = "BYTES", required = true, allow_negative_numbers = true)]
    values: Vec<String>,
}

#[derive(Debug, Clone, Args)]
struct UsageArgs {
    /// Device capacity in bytes.
    #[arg(long, value_name = "BYTES", allow_negative_numbers = true)]
    total: String,
    /// Free bytes; omit when only the capacity is known.
    #[arg(long, value_name = "BYTES", allow_negative_numbers = true)]
    free: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration and print its hash.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Config or report could not be serialized.
    #[error("{0}")]
    Serialize(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) | Self::Serialize(_) => 3,
        }
    }
}

impl From<GaugeError> for CliError {
    fn from(err: GaugeError) -> Self {
        match err {
            GaugeError::Serialization { .. } => Self::Serialize(err.to_string()),
            _ if err.is_user_error() => Self::User(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Optional JSONL sink; a no-op when `--log` was not given.
struct ActivityLog(Option<JsonlWriter>);

impl ActivityLog {
    fn open(cli: &Cli, cfg: &Config) -> Self {
        Self(cli.log.as_ref().map(|path| {
            JsonlWriter::open(JsonlConfig::from_config(cfg, path.as_deref()))
        }))
    }

    fn record(&mut self, entry: &LogEntry) {
        if let Some(writer) = self.0.as_mut() {
            writer.write_entry(entry);
        }
    }

    /// Record a rejected input before it turns into a `CliError`.
    fn checked<T>(&mut self, result: Result<T, GaugeError>) -> Result<T, GaugeError> {
        if let Err(err) = &result {
            self.record(&LogEntry::error(err));
        }
        result
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    if let Command::Completions(args) = &cli.command {
        let mut command = Cli::command();
        let binary_name = command.get_name().to_string();
        generate(args.shell, &mut command, binary_name, &mut io::stdout());
        return Ok(());
    }

    let cfg = load_config(cli)?;
    let mut log = ActivityLog::open(cli, &cfg);
    log.record(&LogEntry::config_loaded(&cfg));

    match &cli.command {
        Command::Humanize(args) => run_humanize(cli, &cfg, args, &mut log),
        Command::Usage(args) => run_usage(cli, &cfg, args, &mut log),
        Command::Config(args) => run_config(cli, &cfg, args),
        Command::Completions(_) => Ok(()),
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(precision) = cli.precision {
        if precision > MAX_PRECISION {
            return Err(CliError::User(format!(
                "--precision must be in [0, {MAX_PRECISION}], got {precision}"
            )));
        }
        cfg.humanize.precision = precision;
    }
    if cli.binary {
        cfg.humanize.base = SizeBase::Binary;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run_humanize(
    cli: &Cli,
    cfg: &Config,
    args: &HumanizeArgs,
    log: &mut ActivityLog,
) -> Result<(), CliError> {
    let calc = UsageCalculator::new(cfg);
    let sizes = args
        .values
        .iter()
        .map(|raw| log.checked(parse_byte_arg(raw)).map(|bytes| calc.humanize(bytes)))
        .collect::<Result<Vec<_>, _>>()?;

    for size in &sizes {
        log.record(&LogEntry::humanized(size));
    }

    match output_mode(cli) {
        OutputMode::Human => {
            let mut out = io::stdout().lock();
            for size in &sizes {
                writeln!(out, "{}", render_size_line(size))?;
            }
        }
        OutputMode::Json => write_json_line(&serde_json::to_value(&sizes)?)?,
    }
    Ok(())
}

fn run_usage(
    cli: &Cli,
    cfg: &Config,
    args: &UsageArgs,
    log: &mut ActivityLog,
) -> Result<(), CliError> {
    let total = log.checked(parse_byte_arg(&args.total))?;
    let free = args
        .free
        .as_deref()
        .map(|raw| log.checked(parse_byte_arg(raw)))
        .transpose()?;

    let snapshot = UsageCalculator::new(cfg).compute(total, free);
    log.record(&LogEntry::usage(&snapshot));
    if let Some(anomaly) = snapshot.anomaly {
        log.record(&LogEntry::anomaly(&snapshot, anomaly));
    }

    match output_mode(cli) {
        OutputMode::Human => {
            if let Some(anomaly) = snapshot.anomaly {
                eprintln!("ugauge: warning: {}", describe_anomaly(anomaly));
            }
            print!("{}", render_usage_human(&snapshot));
        }
        OutputMode::Json => write_json_line(&serde_json::to_value(snapshot)?)?,
    }
    Ok(())
}

fn run_config(cli: &Cli, cfg: &Config, args: &ConfigArgs) -> Result<(), CliError> {
    let mode = output_mode(cli);
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Path => match mode {
            OutputMode::Human => println!("{}", cfg.paths.config_file.display()),
            OutputMode::Json => write_json_line(&json!({
                "config_file": cfg.paths.config_file,
                "exists": cfg.paths.config_file.exists(),
            }))?,
        },
        ConfigCommand::Show => match mode {
            OutputMode::Human => print!("{}", cfg.to_toml()?),
            OutputMode::Json => write_json_line(&serde_json::to_value(cfg)?)?,
        },
        ConfigCommand::Validate => {
            let hash = cfg.stable_hash()?;
            match mode {
                OutputMode::Human => println!("config valid (hash {hash})"),
                OutputMode::Json => write_json_line(&json!({ "valid": true, "hash": hash }))?,
            }
        }
    }
    Ok(())
}

/// Decimal count, or `hi:lo` big-endian u32 limbs as the UI transports them.
fn parse_byte_arg(raw: &str) -> Result<ByteQuantity, GaugeError> {
    if !raw.contains(':') {
        return raw.parse();
    }
    let limbs = raw
        .split(':')
        .map(|limb| {
            limb.trim().parse::<u32>().map_err(|error| {
                GaugeError::invalid_input(format!("bad limb {limb:?} in {raw:?}: {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    ByteQuantity::from_be_limbs(&limbs)
}

fn render_size_line(size: &HumanizedSize) -> String {
    format!("{:>24}  {size}", size.bytes())
}

fn render_usage_human(snapshot: &UsageSnapshot) -> String {
    let percent = paint_percent(&format!("{}%", snapshot.percent), snapshot.tier);

    let mut out = String::new();
    if snapshot.free_known {
        out.push_str(&format!("used   {} ({percent})\n", snapshot.used));
        out.push_str(&format!("free   {} of {}\n", snapshot.free, snapshot.total));
    } else {
        out.push_str("used   unknown (free space not reported)\n");
    }
    out.push_str(&format!("total  {}\n", snapshot.total));
    out.push_str(&format!("tier   {}\n", snapshot.tier));
    out
}

fn paint_percent(text: &str, tier: SeverityTier) -> ColoredString {
    let painted = match hex_rgb(tier.color_token()) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    };
    if tier.is_critical() {
        painted.bold()
    } else {
        painted
    }
}

/// `#RRGGBB` → channels.
fn hex_rgb(token: &str) -> Option<(u8, u8, u8)> {
    let hex = token.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(hex.get(at..at + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn describe_anomaly(anomaly: UsageAnomaly) -> String {
    match anomaly {
        UsageAnomaly::FreeExceedsTotal { excess } => {
            format!("free space exceeds total by {excess} bytes; used clamped to 0")
        }
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("UG_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

fn write_json_line<T: Serialize>(payload: &T) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, payload)?;
    writeln!(out)?;
    Ok(())
}
