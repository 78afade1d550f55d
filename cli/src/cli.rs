// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use clap::{
    ArgAction, ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser,
};
use colored::Colorize;
use davprobe_discovery::{CancellationToken, Cancelled, Discovery, Hint};
use tracing_subscriber::EnvFilter;

use crate::APP_NAME;
use crate::config::{Credentials, parse_config};
use crate::report::Report;

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// Credentials and timeout given on the command line or in the environment
    pub credentials: Credentials,

    /// Print the result as JSON
    pub json: bool,

    /// Verbosity, the number of `-v` flags
    pub verbose: u8,

    /// URL, host name or email address to start from
    pub hint: String,
}

impl Cli {
    /// Create the command-line interface
    #[must_use]
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Find the CalDAV and CardDAV services behind a URL or an email address.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/davprobe/config.toml on Linux and \
MacOS, %LOCALAPPDATA%/davprobe/config.toml on Windows.",
                    )
                    .env("DAVPROBE_CONFIG")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(
                arg!(-u --username [USERNAME] "User name for basic authentication")
                    .env("DAVPROBE_USERNAME"),
            )
            .arg(
                arg!(-p --password [PASSWORD] "Password for basic authentication")
                    .env("DAVPROBE_PASSWORD")
                    .hide_env_values(true),
            )
            .arg(
                arg!(--token [TOKEN] "Bearer token, takes precedence over the password")
                    .env("DAVPROBE_TOKEN")
                    .hide_env_values(true),
            )
            .arg(
                arg!(--timeout [SECONDS] "Timeout of every request, in seconds")
                    .value_parser(value_parser!(u64)),
            )
            .arg(arg!(--json "Print the result as JSON"))
            .arg(
                arg!(-v --verbose "Log more, repeat for even more")
                    .action(ArgAction::Count),
            )
            .arg(
                arg!(<HINT> "URL, host name or email address of the account")
                    .value_hint(ValueHint::Url),
            )
    }

    /// Parse the command-line arguments, exiting on error
    #[must_use]
    pub fn parse() -> Self {
        let matches = Self::command().get_matches();
        Self::from(&matches)
    }

    /// Parse the specified arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Ok(Self::from(&matches))
    }

    /// Create a CLI instance from the `ArgMatches`
    #[must_use]
    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            config: matches.get_one("config").cloned(),
            credentials: Credentials {
                username: matches.get_one("username").cloned(),
                password: matches.get_one("password").cloned(),
                token: matches.get_one("token").cloned(),
                timeout_secs: matches.get_one("timeout").copied(),
            },
            json: matches.get_flag("json"),
            verbose: matches.get_count("verbose"),
            hint: matches.get_one::<String>("HINT").cloned().unwrap_or_default(),
        }
    }

    /// Run one discovery and print its result
    ///
    /// # Errors
    ///
    /// Returns an error if the hint or the configuration is invalid, or the HTTP client cannot
    /// be set up.
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        init_tracing(self.verbose);

        let hint = Hint::parse(&self.hint)?;
        tracing::debug!("Parsing configuration...");
        let config = parse_config(self.config).await?;
        let config = self.credentials.apply(config, &hint);
        let discovery = Discovery::new(config)?;

        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupted, cancelling discovery");
                    cancel.cancel();
                }
            })
        };

        let result = discovery.discover(&hint, &cancel).await;
        interrupt.abort();

        match result {
            Ok(result) if self.json => println!("{}", serde_json::to_string_pretty(&result)?),
            Ok(result) => print!("{}", Report::new(&result)),
            Err(Cancelled) => println!("{}", "cancelled".yellow()),
        }
        Ok(())
    }
}

/// Installs the tracing subscriber on stderr.
///
/// `-v` flags win over `RUST_LOG`, which wins over the default of `warn`.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hint() {
        let cli = Cli::try_parse_from(vec!["test", "alice@example.com"]).unwrap();
        assert_eq!(cli.hint, "alice@example.com");
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_requires_hint() {
        assert!(Cli::try_parse_from(vec!["test"]).is_err());
    }

    #[test]
    fn test_parse_config() {
        let cli =
            Cli::try_parse_from(vec!["test", "-c", "/tmp/config.toml", "example.com"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
    }

    #[test]
    fn test_parse_credentials() {
        let cli = Cli::try_parse_from(vec![
            "test",
            "-u",
            "alice",
            "-p",
            "secret",
            "--timeout",
            "5",
            "https://dav.example.com/",
        ])
        .unwrap();
        assert_eq!(cli.credentials.username.as_deref(), Some("alice"));
        assert_eq!(cli.credentials.password.as_deref(), Some("secret"));
        assert_eq!(cli.credentials.timeout_secs, Some(5));
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(vec!["test", "--json", "-vv", "example.com"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_invalid_timeout() {
        let result = Cli::try_parse_from(vec!["test", "--timeout", "soon", "example.com"]);
        assert!(result.is_err());
    }
}
