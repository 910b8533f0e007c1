//! This is the primary binary for the munki API server.

#![deny(rust_2018_idioms)]

#[macro_use]
extern crate log;

use argh::FromArgs;
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};
use snafu::{ensure, ResultExt};
use std::path::PathBuf;
use std::process;

use munkiserver::config::Config;
use munkiserver::serve;

type Result<T> = std::result::Result<T, error::Error>;

mod error {
    use snafu::Snafu;
    use std::path::PathBuf;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub(super) enum Error {
        #[snafu(display("{}", source))]
        Config {
            source: munkiserver::config::Error,
        },

        #[snafu(display("Repository '{}' does not exist", path.display()))]
        NonexistentRepository { path: PathBuf },

        #[snafu(display("{}", source))]
        Server { source: munkiserver::server::Error },

        #[snafu(display("Logger setup error: {}", source))]
        Logger { source: log::SetLoggerError },
    }
}

/// Serves a munki repository over HTTP
#[derive(FromArgs, PartialEq, Debug)]
struct Args {
    /// path to the TOML config file (default /etc/munkiserver.toml, if present)
    #[argh(option)]
    config: Option<PathBuf>,

    /// path to the munki repository
    #[argh(option)]
    repo: Option<PathBuf>,

    /// address and port to listen on (default 0.0.0.0:8080)
    #[argh(option)]
    listen: Option<String>,

    /// number of worker threads (default one per CPU)
    #[argh(option)]
    threads: Option<usize>,

    /// log-level trace|debug|info|warn|error
    #[argh(option)]
    log_level: Option<LevelFilter>,
}

impl Args {
    /// Command-line values, in the same shape as the config file so they can be merged.
    fn into_config(self) -> Config {
        Config {
            listen: self.listen,
            repo: self.repo,
            threads: self.threads,
            log_level: self.log_level.map(|level| level.to_string()),
        }
    }
}

/// Starts a web server to accept user requests, dispatching those requests to the controller.
async fn run() -> Result<()> {
    let args: Args = argh::from_env();

    let file = Config::load(args.config.as_deref()).context(error::ConfigSnafu)?;
    let settings = args
        .into_config()
        .resolve(file)
        .context(error::ConfigSnafu)?;

    // TerminalMode::Mixed will send errors to stderr and anything less to stdout.
    TermLogger::init(
        settings.log_level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context(error::LoggerSnafu)?;

    // Make sure the repository exists
    ensure!(
        settings.repo.is_dir(),
        error::NonexistentRepositorySnafu {
            path: &settings.repo
        }
    );

    let threads = match settings.threads {
        Some(n) if n > 1 => format!("{} threads", n),
        Some(_) => "1 thread".to_string(),
        None => "one thread per CPU".to_string(),
    };
    info!(
        "Starting server at {} with {} and repository at {}",
        settings.listen,
        threads,
        settings.repo.display(),
    );

    serve(&settings.listen, &settings.repo, settings.threads)
        .await
        .context(error::ServerSnafu)
}

// Returning a Result from main makes it print a Debug representation of the error, but with Snafu
// we have nice Display representations of the error, so we wrap "main" (run) and print any error.
// https://github.com/shepmaster/snafu/issues/110
#[actix_web::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}", e);
        process::exit(1);
    }
}
