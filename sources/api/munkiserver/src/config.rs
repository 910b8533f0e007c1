//! The config module reads the server's TOML configuration file and merges it with command-line
//! settings.

use serde::Deserialize;
use simplelog::LevelFilter;
use snafu::{ensure, ResultExt, Snafu};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/munkiserver.toml";
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Unable to read config file '{}': {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse config file '{}': {}", path.display(), source))]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("Invalid log level '{}'", level))]
    LogLevel { level: String },

    #[snafu(display("No repository path given on the command line or in the config file"))]
    MissingRepo,

    #[snafu(display("Thread count must be at least 1"))]
    ZeroThreads,
}

pub type Result<T> = std::result::Result<T, Error>;

/// The contents of the config file.  Every setting is optional, since it can also come from the
/// command line.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub listen: Option<String>,
    pub repo: Option<PathBuf>,
    pub threads: Option<usize>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).context(ConfigReadSnafu { path })?;
        let config: Config = toml::from_str(&s).context(ConfigParseSnafu { path })?;
        Ok(config)
    }

    /// Reads the given config file, or the default one if it exists.  An explicitly requested
    /// file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Fills in anything not set in `self` from `file`, then applies defaults, and checks the
    /// result.  Values in `self` (from the command line) win.
    pub fn resolve(self, file: Config) -> Result<Settings> {
        let level = self
            .log_level
            .or(file.log_level)
            .unwrap_or_else(|| "info".to_string());
        let log_level = match LevelFilter::from_str(&level) {
            Ok(log_level) => log_level,
            Err(_) => return LogLevelSnafu { level }.fail(),
        };

        let threads = self.threads.or(file.threads);
        ensure!(threads != Some(0), ZeroThreadsSnafu);

        let repo = match self.repo.or(file.repo) {
            Some(repo) => repo,
            None => return MissingRepoSnafu.fail(),
        };

        Ok(Settings {
            listen: self
                .listen
                .or(file.listen)
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string()),
            repo,
            threads,
            log_level,
        })
    }
}

/// Complete, validated server settings.
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub listen: String,
    pub repo: PathBuf,
    /// Number of workers; actix picks one per CPU if unset.
    pub threads: Option<usize>,
    pub log_level: LevelFilter,
}
