use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use insight_core::Flow;
use insight_engine::EngineSettings;
use insight_logging::{insight_info, LogDestination, LogSettings};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "./insight.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowChoice {
    #[default]
    Insights,
    Visualize,
}

impl From<FlowChoice> for Flow {
    fn from(choice: FlowChoice) -> Self {
        match choice {
            FlowChoice::Insights => Flow::Insights,
            FlowChoice::Visualize => Flow::Visualize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogChoice {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogChoice> for LogDestination {
    fn from(choice: LogChoice) -> Self {
        match choice {
            LogChoice::File => LogDestination::File,
            LogChoice::Terminal => LogDestination::Terminal,
            LogChoice::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_duration_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_duration_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    pub output_dir: PathBuf,
    pub open_viewer: bool,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./print"),
            open_viewer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub destination: LogChoice,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogChoice::File,
            level: "info".to_string(),
            file: PathBuf::from("./insight.log"),
        }
    }
}

/// Settings read from `insight.ron`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub flow: FlowChoice,
    pub poll: PollConfig,
    pub http: HttpConfig,
    pub print: PrintConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            flow: FlowChoice::default(),
            poll: PollConfig::default(),
            http: HttpConfig::default(),
            print: PrintConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Command-line overrides; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub flow: Option<FlowChoice>,
    pub log: Option<LogChoice>,
}

impl AppConfig {
    /// Loads `path`, or `./insight.ron` when no path is given. Only the
    /// default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };

        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(flow) = overrides.flow {
            self.flow = flow;
        }
        if let Some(log) = overrides.log {
            self.log.destination = log;
        }
        self
    }

    pub fn flow(&self) -> Flow {
        self.flow.into()
    }

    pub fn log_settings(&self) -> Result<LogSettings> {
        let level: LevelFilter = self
            .log
            .level
            .parse()
            .with_context(|| format!("unknown log level {:?}", self.log.level))?;
        Ok(LogSettings {
            destination: self.log.destination.into(),
            level,
            file: self.log.file.clone(),
        })
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        let mut settings = EngineSettings::new(base_url);
        settings.client.connect_timeout = Duration::from_secs(self.http.connect_timeout_secs);
        settings.client.request_timeout = Duration::from_secs(self.http.request_timeout_secs);
        settings.poll.interval = Duration::from_millis(self.poll.interval_ms);
        settings.poll.max_duration = self.poll.max_duration_secs.map(Duration::from_secs);
        settings.print.output_dir = self.print.output_dir.clone();
        settings.print.open_viewer = self.print.open_viewer;
        insight_info!(
            "engine settings: base_url={} poll={:?}",
            settings.client.base_url,
            settings.poll
        );
        Ok(settings)
    }
}
