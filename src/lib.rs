pub mod config;
pub mod inference;
pub mod planner;
pub mod retrieval;
pub mod session;

use std::path::{Path, PathBuf};

use config::LoggingConfig;

pub use planner::{PlannerError, TripPlanner, TurnOutcome, TurnRequest};

/// Return the platform-standard data directory for TripPlanner.
///
/// - macOS: `~/Library/Application Support/tripplanner/`
/// - Windows: `{FOLDERID_RoamingAppData}\tripplanner\`
/// - Linux: `$XDG_DATA_HOME/tripplanner/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.tripplanner/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("tripplanner");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tripplanner")
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` overrides the configured filter. When a log file is
/// configured, existing logs are rotated (planner.log → planner.log.1 → .2
/// → .3) and output goes to a fresh file through a line-flushing writer;
/// otherwise to stderr. Returns the log file actually in use.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) -> Option<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_str()));

    let log_file = config.file.as_deref().and_then(|path| {
        open_log_file(path)
            .map_err(|e| eprintln!("tripplanner: cannot open log file {}: {e}", path.display()))
            .ok()
            .map(|file| (path.to_path_buf(), file))
    });

    let (writer, log_path) = match log_file {
        Some((path, file)) => (BoxMakeWriter::new(FlushingWriter::new(file)), Some(path)),
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_path.is_none())
        .with_target(true)
        .with_thread_ids(false);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            log_file = ?log_path,
            pid = std::process::id(),
            "=== TripPlanner starting ==="
        );
    }

    log_path
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    rotate_log_file(path, 3);
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Rotate log files: `planner.log` → `planner.log.1` → `.2` → … → `.{keep}`.
///
/// Oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A writer that wraps `std::fs::File` and flushes after every write.
///
/// `tracing-subscriber` buffers log output internally; flushing per write
/// keeps each line on disk if the process dies mid-turn.
#[derive(Clone)]
struct FlushingWriter {
    file: std::sync::Arc<std::sync::Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: std::sync::Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        std::io::Write::flush(&mut *f)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
