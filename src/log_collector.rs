//! Session logging for the resolver.
//!
//! Every `log` record is appended, timestamped, to a per-session file under
//! `./logs/`. Warnings and errors are echoed to stderr so an interactive run still
//! surfaces them; stdout is left to resolved output.
//!
//! ```text
//! log::info!(...)
//!     |
//! [LogCollector]
//!     +--> logs/rtkernel_<ts>.log   (every enabled record)
//!     +--> stderr                   (warn and error only)
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Get the global logs path relative to the current working directory: ./logs
pub fn get_global_logs_path() -> Result<PathBuf, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to get current working directory: {}", e))?;
    Ok(cwd.join("logs"))
}

/// Ensure the global logs directory exists
pub fn ensure_logs_dir_exists(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create logs directory: {}", e))?;
    Ok(())
}

/// A formatted log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    pub level: Level,
    pub message: String,
}

impl LogLine {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogLine {
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            level,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level, self.message)
    }
}

/// `log::Log` implementation writing to a session file
pub struct LogCollector {
    level: LevelFilter,
    session_path: PathBuf,
    file: Mutex<File>,
    echo_stderr: bool,
}

impl LogCollector {
    /// Open a new session file `rtkernel_<timestamp>.log` in `log_dir`
    pub fn new(log_dir: &Path, level: LevelFilter) -> Result<Self, String> {
        ensure_logs_dir_exists(log_dir)?;

        let filename = format!("rtkernel_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let session_path = log_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&session_path)
            .map_err(|e| format!("Failed to open log file {}: {}", session_path.display(), e))?;

        Ok(LogCollector {
            level,
            session_path,
            file: Mutex::new(file),
            echo_stderr: true,
        })
    }

    /// Disable the stderr echo (used by tests)
    pub fn quiet(mut self) -> Self {
        self.echo_stderr = false;
        self
    }

    pub fn session_log_path(&self) -> &Path {
        &self.session_path
    }

    /// Install as the global logger
    pub fn install(self) -> Result<PathBuf, String> {
        let path = self.session_path.clone();
        let level = self.level;
        log::set_boxed_logger(Box::new(self))
            .map_err(|e| format!("Failed to install logger: {}", e))?;
        log::set_max_level(level);
        Ok(path)
    }

    fn persist(&self, line: &LogLine) {
        let rendered = line.render();
        match self.file.lock() {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", rendered) {
                    eprintln!("[Log] [ERROR] Failed to write log line: {}", e);
                }
            }
            Err(_) => eprintln!("[Log] [ERROR] Log file lock poisoned"),
        }
        if self.echo_stderr && line.level <= Level::Warn {
            eprintln!("{}", rendered);
        }
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.persist(&LogLine::new(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}
