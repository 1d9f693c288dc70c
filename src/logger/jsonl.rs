//! JSONL activity log: one self-contained JSON object per line.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees a partial record. When the primary file
//! cannot be written the sink degrades: fallback path, then stderr with a
//! `[UG-JSONL]` prefix, then silent discard. Logging never fails a command.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::errors::{GaugeError, Result};
use crate::size::humanize::HumanizedSize;
use crate::usage::calculator::{UsageAnomaly, UsageSnapshot};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Activity events emitted by the ugauge front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Humanize,
    UsageComputed,
    UsageAnomaly,
    ConfigLoaded,
    Error,
}

/// One JSONL record; only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Byte counts are decimal strings; they may exceed 2^53.
    /// `bytes` is a standalone count, `total_bytes` a device capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a bare entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            bytes: None,
            total_bytes: None,
            free_bytes: None,
            used_bytes: None,
            display: None,
            percent: None,
            tier: None,
            config_hash: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    pub fn humanized(size: &HumanizedSize) -> Self {
        let mut entry = Self::new(EventType::Humanize, Severity::Info);
        entry.bytes = Some(size.bytes().to_string());
        entry.display = Some(size.to_string());
        entry
    }

    /// `UsageComputed` record; a `Critical` tier is logged at critical severity.
    pub fn usage(snapshot: &UsageSnapshot) -> Self {
        let severity = if snapshot.tier.is_critical() {
            Severity::Critical
        } else {
            Severity::Info
        };
        let mut entry = Self::new(EventType::UsageComputed, severity);
        entry.total_bytes = Some(snapshot.total.bytes().to_string());
        entry.free_bytes = snapshot
            .free_known
            .then(|| snapshot.free.bytes().to_string());
        entry.used_bytes = Some(snapshot.used.bytes().to_string());
        entry.display = Some(format!("{} of {}", snapshot.used, snapshot.total));
        entry.percent = Some(snapshot.percent);
        entry.tier = Some(snapshot.tier.to_string());
        entry
    }

    pub fn anomaly(snapshot: &UsageSnapshot, anomaly: UsageAnomaly) -> Self {
        let mut entry = Self::new(EventType::UsageAnomaly, Severity::Warning);
        entry.total_bytes = Some(snapshot.total.bytes().to_string());
        entry.free_bytes = Some(snapshot.free.bytes().to_string());
        entry.details = Some(match anomaly {
            UsageAnomaly::FreeExceedsTotal { excess } => {
                format!("free exceeds total by {excess} bytes; used clamped to 0")
            }
        });
        entry
    }

    pub fn config_loaded(cfg: &Config) -> Self {
        let mut entry = Self::new(EventType::ConfigLoaded, Severity::Info);
        entry.config_hash = cfg.stable_hash().ok();
        entry.details = Some(cfg.paths.config_file.display().to_string());
        entry
    }

    pub fn error(err: &GaugeError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Warning);
        entry.error_code = Some(err.code().to_string());
        entry.error_message = Some(err.to_string());
        entry
    }
}

/// Where lines currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Optional second file, ideally on another filesystem.
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the current file would grow past this.
    pub max_size_bytes: u64,
    /// Rotated files kept as `name.1` .. `name.N`.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// Log settings from the effective config, optionally redirected to `path`.
    pub fn from_config(cfg: &Config, path: Option<&Path>) -> Self {
        Self {
            path: path.map_or_else(|| cfg.paths.jsonl_log.clone(), Path::to_path_buf),
            fallback_path: cfg.log.fallback_path.clone(),
            max_size_bytes: cfg.log.max_size_bytes,
            max_rotated_files: cfg.log.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with rotation and fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    sink: Sink,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log, degrading through the sink chain on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            sink: Sink::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => w.attach(file, size, Sink::Primary),
            Err(_) => w.open_fallback(),
        }
        w
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[UG-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current sink: `primary`, `fallback`, `stderr` or `discard`.
    pub fn state(&self) -> &'static str {
        match self.sink {
            Sink::Primary => "primary",
            Sink::Fallback => "fallback",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn attach(&mut self, file: File, size: u64, sink: Sink) {
        self.writer = Some(BufWriter::new(file));
        self.bytes_written = size;
        self.sink = sink;
    }

    fn current_path(&self) -> Option<&Path> {
        match self.sink {
            Sink::Primary => Some(&self.config.path),
            Sink::Fallback => self.config.fallback_path.as_deref(),
            Sink::Stderr | Sink::Discard => None,
        }
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.bytes_written > 0 && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }

        match self.sink {
            Sink::Primary | Sink::Fallback => {
                let ok = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if ok {
                    self.bytes_written += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            Sink::Stderr => {
                let _ = write!(io::stderr(), "[UG-JSONL] {line}");
            }
            Sink::Discard => {}
        }
    }

    fn open_fallback(&mut self) {
        let opened = self
            .config
            .fallback_path
            .as_deref()
            .and_then(|fb| open_append(fb).ok());
        if let Some((file, size)) = opened {
            self.attach(file, size, Sink::Fallback);
        } else {
            self.writer = None;
            self.sink = Sink::Stderr;
            let _ = writeln!(
                io::stderr(),
                "[UG-JSONL] log file unavailable, writing events to stderr"
            );
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.sink {
            Sink::Primary => self.open_fallback(),
            Sink::Fallback => self.sink = Sink::Stderr,
            Sink::Stderr | Sink::Discard => self.sink = Sink::Discard,
        }
    }

    fn rotate(&mut self) {
        self.flush();
        let Some(base) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        self.writer = None;

        // name.(N-1) -> name.N, ..., name -> name.1; the oldest falls off.
        let keep = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(&base, keep));
        for i in (1..keep).rev() {
            let _ = fs::rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = fs::rename(&base, rotated_name(&base, 1));

        match open_append(&base) {
            Ok((file, size)) => {
                let sink = self.sink;
                self.attach(file, size, sink);
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| GaugeError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| GaugeError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `foo.jsonl` → `foo.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
