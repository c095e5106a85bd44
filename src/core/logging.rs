//! Terminal and File Logging
//!
//! Provides:
//! - A pretty stderr logger and a JSON daily-rolling file logger (tracing)
//! - Bridging of `log` macros used across the library into `tracing`
//! - Error reporting configured from terminal capabilities (miette)
//! - Background gzip compression of rotated logs
//! - A spinner style for CLI waits (indicatif)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};

use console::Term;
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::ProgressStyle;
use supports_color::Stream;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "searchbox.log";

static STDERR_PROFILE: OnceLock<StderrProfile> = OnceLock::new();

/// What stderr can render, detected once per process.
#[derive(Debug, Clone, Copy)]
pub struct StderrProfile {
    pub interactive: bool,
    pub color: bool,
    pub truecolor: bool,
    pub unicode: bool,
}

impl StderrProfile {
    pub fn detect() -> Self {
        use is_terminal::IsTerminal;

        let interactive = io::stderr().is_terminal();
        let support = supports_color::on(Stream::Stderr);
        Self {
            interactive,
            color: interactive && support.as_ref().is_some_and(|s| s.has_basic),
            truecolor: support.as_ref().is_some_and(|s| s.has_16m),
            unicode: Term::stderr().features().wants_emoji(),
        }
    }
}

pub fn stderr_profile() -> StderrProfile {
    *STDERR_PROFILE.get_or_init(StderrProfile::detect)
}

/// Default log directory inside the user data directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("searchbox").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize the logging system.
///
/// This sets up:
/// 1. A stderr logger (pretty formatted), leaving stdout to command output.
/// 2. A file logger (JSON formatted) when `config.file` is set.
/// 3. Redirects standard `log` crate events to `tracing`.
/// 4. Configures miette for error reporting.
///
/// `RUST_LOG` overrides `config.level`. The returned guard must be kept alive
/// so buffered file logs are flushed on shutdown.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(stderr_profile().color)
        .pretty()
        .with_filter(env_filter.clone());

    let (file_layer, guard, log_dir) = if config.file {
        let log_dir = config.directory.clone().unwrap_or_else(default_log_dir);
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory {:?}: {}", log_dir, e);
        }

        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // File Layer: JSON format for easy parsing/ingestion
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_filter(env_filter);

        (Some(layer), Some(guard), Some(log_dir))
    } else {
        (None, None, None)
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
    }

    // No-op when the subscriber already installed the bridge
    let _ = tracing_log::LogTracer::init();

    init_miette();

    if let Some(log_dir) = log_dir {
        // Compress after init so the log macros reach the subscriber
        let dir = log_dir.clone();
        std::thread::spawn(move || compress_old_logs(&dir));

        log::debug!(
            "Logging initialized. Writing to: {:?} (daily rolling)",
            log_dir.join(LOG_FILE_PREFIX)
        );
    }

    guard
}

/// Install a test-writer subscriber once per test binary.
pub fn init_for_tests() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Whether `name` is a rotated log (not today's, not yet compressed).
fn should_compress(name: &str, today_suffix: &str) -> bool {
    name.starts_with(&format!("{}.", LOG_FILE_PREFIX))
        && !name.ends_with(today_suffix)
        && !name.ends_with(".gz")
}

/// Compress old log files in the background
fn compress_old_logs(log_dir: &Path) {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if should_compress(name, &today_suffix) {
            match compress_file(&path) {
                Ok(()) => log::info!("Compressed old log: {:?}", path),
                Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
            }
        }
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let file = fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);

    let mut gz_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let gz_path = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?
        .join(gz_name);

    // Skip if already exists
    if gz_path.exists() {
        return Ok(());
    }

    let output = fs::File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());

    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;

    Ok(())
}

/// Report hook for the binary's top-level errors.
fn init_miette() {
    let profile = stderr_profile();

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(profile.truecolor)
                .unicode(profile.unicode)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(profile.color)
                .build(),
        )
    }))
    .ok();
}

/// Spinner for waiting on a request
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
