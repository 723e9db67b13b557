use anyhow::{bail, Result};
use clap::Parser;
use std::ffi::OsString;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 1188;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Command line flags; each one falls back to an environment variable
#[derive(Debug, Clone, Parser)]
#[command(name = "translate-relay", version, about = "Relay translation requests upstream")]
pub struct Cli {
    /// Host to listen on (all interfaces when empty)
    #[arg(long, env = "RELAY_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "RELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Upstream API key
    #[arg(long = "key", env = "RELAY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long = "timeout", env = "RELAY_UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub upstream_timeout: Duration,
}

impl Config {
    /// Validate parsed flags. Fails when no API key was given.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let api_key = match cli.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!("No api key found, please use --key or RELAY_API_KEY to set up the api key"),
        };

        if cli.timeout_secs == 0 {
            bail!("Upstream timeout must be at least one second");
        }

        let host = if cli.host.trim().is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            cli.host
        };

        Ok(Self {
            host,
            port: cli.port,
            api_key,
            upstream_timeout: Duration::from_secs(cli.timeout_secs),
        })
    }

    /// Parse flags from the process arguments and environment
    pub fn load() -> Result<Self> {
        Self::from_cli(Cli::parse_from(normalize_legacy_flags(std::env::args_os())))
    }

    /// Address string suitable for `TcpListener::bind`
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Long flags that older invocations spell with a single dash
const LEGACY_FLAGS: [&str; 4] = ["key", "host", "port", "timeout"];

/// Rewrite `-key`, `-host=x` and friends to their `--` form.
///
/// Everything else, including the `-p` short flag, is left untouched.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split('=').next().unwrap_or(rest);
            if LEGACY_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}
