use clap::Parser;
use derive_more::{Display, Error};
use std::{fmt, path::PathBuf, time::Duration};

pub static TESTLINK_URL: &str = "TESTLINK_URL";
pub static TESTLINK_DEVKEY: &str = "TESTLINK_DEVKEY";
pub static TESTLINK_PROJECT_ID: &str = "TESTLINK_PROJECT_ID";
pub static TESTLINK_REQSPEC_ID: &str = "TESTLINK_REQSPEC_ID";
pub static TESTLINK_TIMEOUT_SECS: &str = "TESTLINK_TIMEOUT_SECS";

/// Command line / environment surface. Everything is optional here so that
/// missing values surface as a [`ConfigError`] naming the variable.
#[derive(Parser, Debug)]
#[command(
    name = "requirement-butler",
    version,
    about = "Forward a GitHub issue event to TestLink as a requirement"
)]
pub struct Args {
    /// TestLink XML-RPC endpoint, e.g. `https://testlink.example.com/lib/api/xmlrpc/v1/xmlrpc.php`
    #[arg(long, env = "TESTLINK_URL")]
    pub testlink_url: Option<String>,

    /// TestLink developer key of the API user
    #[arg(long, env = "TESTLINK_DEVKEY", hide_env_values = true)]
    pub testlink_devkey: Option<String>,

    /// Id of the TestLink test project
    #[arg(long, env = "TESTLINK_PROJECT_ID")]
    pub testlink_project_id: Option<String>,

    /// Id of the requirement specification new requirements are created in
    #[arg(long, env = "TESTLINK_REQSPEC_ID")]
    pub testlink_reqspec_id: Option<String>,

    /// Path to the webhook event payload (set by GitHub Actions)
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<String>,

    /// `owner/repo` the event belongs to, only used in log output
    #[arg(long, env = "GITHUB_REPOSITORY", default_value = crate::DEFAULT_REPOSITORY)]
    pub repository: String,

    /// Timeout for the TestLink request in seconds
    #[arg(long, env = "TESTLINK_TIMEOUT_SECS")]
    pub timeout_secs: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[display("Missing required configuration value `{key}`")]
    Missing { key: &'static str },
    #[display("Configuration value `{key}` must be an integer, got `{value}`")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub testlink_url: String,
    pub testlink_devkey: String,
    pub testlink_project_id: i64,
    pub testlink_reqspec_id: i64,
    /// `None` means there is no event to forward
    pub event_path: Option<PathBuf>,
    pub repository: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("testlink_url", &self.testlink_url)
            .field("testlink_devkey", &"<redacted>")
            .field("testlink_project_id", &self.testlink_project_id)
            .field("testlink_reqspec_id", &self.testlink_reqspec_id)
            .field("event_path", &self.event_path)
            .field("repository", &self.repository)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let testlink_url = required(args.testlink_url, TESTLINK_URL)?;
        let testlink_devkey = required(args.testlink_devkey, TESTLINK_DEVKEY)?;
        let testlink_project_id = integer(
            required(args.testlink_project_id, TESTLINK_PROJECT_ID)?,
            TESTLINK_PROJECT_ID,
        )?;
        let testlink_reqspec_id = integer(
            required(args.testlink_reqspec_id, TESTLINK_REQSPEC_ID)?,
            TESTLINK_REQSPEC_ID,
        )?;

        let timeout = match args.timeout_secs.filter(|secs| !secs.trim().is_empty()) {
            Some(secs) => {
                let secs = integer(secs, TESTLINK_TIMEOUT_SECS)?;
                let secs = u64::try_from(secs).map_err(|_| ConfigError::Invalid {
                    key: TESTLINK_TIMEOUT_SECS,
                    value: secs.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            testlink_url,
            testlink_devkey,
            testlink_project_id,
            testlink_reqspec_id,
            event_path: args
                .event_path
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            repository: args.repository,
            timeout,
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { key }),
    }
}

fn integer(value: String, key: &'static str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
