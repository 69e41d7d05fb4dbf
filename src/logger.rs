use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{ForgeError, Result};

static FORGE_LOGGER: Lazy<ForgeLogger> = Lazy::new(ForgeLogger::new);

pub fn init() -> Result<()> {
    init_with_config(LoggerConfig::from_env())
}

pub fn init_with_config(config: LoggerConfig) -> Result<()> {
    FORGE_LOGGER.update_config(config.clone());

    log::set_logger(&*FORGE_LOGGER)
        .map_err(|e| ForgeError::ConfigError(format!("Failed to set logger: {:?}", e)))?;

    log::set_max_level(config.min_level.to_level_filter());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn to_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_level_filter(&self) -> log::LevelFilter {
        self.to_level().to_level_filter()
    }

    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub line: u32,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, module: String, line: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            message,
            module,
            line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_module: bool,
    pub include_timestamp: bool,
    pub timestamp_format: String,
    pub output_json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_module: true,
            include_timestamp: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `RFORGE_LOG_LEVEL` and `RFORGE_LOG_JSON=true` over the defaults.
    pub fn from_env() -> Self {
        let mut config = if env::var("RFORGE_LOG_JSON").map_or(false, |v| v == "true") {
            Self::production()
        } else {
            Self::development()
        };
        if let Some(level) = env::var("RFORGE_LOG_LEVEL")
            .ok()
            .and_then(|v| LogLevel::parse(&v))
        {
            config.min_level = level;
        }
        config
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_colors: true,
            output_json: false,
            ..Default::default()
        }
    }
}

pub struct ForgeLogger {
    config: Mutex<LoggerConfig>,
}

impl ForgeLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        let mut config = self.config.lock().unwrap_or_else(|e| e.into_inner());
        *config = new_config;
    }

    fn format_line(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let mut output = String::new();

        if config.include_timestamp {
            let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
            if config.show_colors {
                output.push_str(&format!("{} ", timestamp.bright_black()));
            } else {
                output.push_str(&format!("{} ", timestamp));
            }
        }

        let level = format!("{:<5}", entry.level.as_str());
        if config.show_colors {
            output.push_str(&format!("[{}] ", level.color(entry.level.color()).bold()));
        } else {
            output.push_str(&format!("[{}] ", level));
        }

        if config.show_module && !entry.module.is_empty() {
            if config.show_colors {
                output.push_str(&format!("{}:{} ", entry.module.bright_blue(), entry.line));
            } else {
                output.push_str(&format!("{}:{} ", entry.module, entry.line));
            }
        }

        output.push_str(&entry.message);
        output
    }

    fn render(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_default()
        } else {
            self.format_line(entry, config)
        }
    }
}

impl Default for ForgeLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for ForgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level.to_level(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::new(
            LogLevel::from_level(record.level()),
            record.args().to_string(),
            record.module_path().unwrap_or("unknown").to_string(),
            record.line().unwrap_or(0),
        );
        if let Ok(config) = self.config.lock() {
            // stderr keeps stdout free for tagged relay lines
            eprintln!("{}", self.render(&entry, &config));
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Measures one operation; logs its duration once, on `stop` or drop.
pub struct Timer {
    start: Instant,
    name: String,
    stopped: bool,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
            stopped: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let duration = self.elapsed();
        if !self.stopped {
            self.stopped = true;
            log::info!("'{}' completed in {}ms", self.name, duration.as_millis());
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.finish();
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, host: &str, port: u16) {
    log::info!("Starting {} v{}", app_name, version);
    log::info!("Server will run on http://{}:{}", host, port);
}

/// Never prints the API key itself.
pub fn log_config_info(config: &crate::config::Config) {
    log::info!("Configuration loaded:");
    log::info!("   Bind: {}:{}", config.host(), config.port());
    log::info!("   Model: {}", config.gemini.model());
    log::info!("   Service: {}", config.gemini.base_url());
    log::info!("   Max upload: {} bytes", config.max_upload_bytes());
    log::info!(
        "   Sessions: at most {}, idle TTL {} min",
        config.max_sessions(),
        config.session_ttl_minutes()
    );
    log::info!(
        "   API key: {}",
        if config.gemini.api_key().is_ok() {
            "present"
        } else {
            "missing"
        }
    );
}
