use std::{fs, io::Write, path::PathBuf};

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Bounded in-memory log mirrored to an append-only file.
#[derive(Debug, Default)]
pub struct Log {
    entries: Vec<LogEntry>,
    path: Option<PathBuf>,
}

impl Log {
    pub fn new(path: Option<PathBuf>) -> Self {
        Log {
            entries: Vec::new(),
            path,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn info(&mut self, message: String) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: String) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: String) {
        self.push(LogLevel::Error, message);
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if let Some(path) = &self.path {
            let _ = append_log_file(path, level, &message);
        }

        self.entries.push(LogEntry { level, message });

        if self.entries.len() > LOG_CAPACITY {
            let overflow = self.entries.len() - LOG_CAPACITY;
            self.entries.drain(0..overflow);
        }
    }
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn log_timestamp() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn append_log_file(path: &PathBuf, level: LogLevel, message: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{} [{label}] {message}", log_timestamp())
}
