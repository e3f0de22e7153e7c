use config::{Config, ConfigError};
use derive_more::{Display, Error};
use events::{issues::IssuesHandler, EventError, Handler};
use testlink::{xmlrpc::Value, TestLinkClient, TestLinkError};
use tracing::info;

pub mod common;
pub mod config;
pub mod events;
pub mod logging;
pub mod requirement;
pub mod testlink;

/// Shown in logs when `GITHUB_REPOSITORY` isn't provided
pub static DEFAULT_REPOSITORY: &str = "repo";
/// Prefix of the TestLink document id, followed by the issue number
pub static DOCID_PREFIX: &str = "GH-";

pub struct State {
    pub config: Config,
    pub testlink: TestLinkClient,
}

impl State {
    pub fn new(config: Config) -> Result<Self, TestLinkError> {
        let testlink = TestLinkClient::new(&config)?;

        Ok(Self { config, testlink })
    }
}

/// What a single invocation ended up doing.
#[derive(Debug)]
pub enum Outcome {
    /// No event payload was available, nothing to forward.
    NoPayload,
    /// The event isn't one we forward (unhandled action or no issue object).
    Ignored { action: String },
    /// The requirement was created or overwritten in TestLink.
    Submitted { docid: String, response: Value },
}

#[derive(Debug, Display, Error)]
pub enum ForwardError {
    #[display("Configuration error: {source}")]
    Configuration { source: ConfigError },
    #[display("Event payload error: {source}")]
    Payload { source: EventError },
    #[display("ERROR calling TestLink XML-RPC: {source}")]
    Submission { source: TestLinkError },
}

impl ForwardError {
    /// Process exit status for this failure. Only a failed submission uses `1`,
    /// which is what the CI step reports as a failed forward.
    pub fn exit_code(&self) -> u8 {
        match self {
            ForwardError::Submission { .. } => 1,
            ForwardError::Configuration { .. } => 2,
            ForwardError::Payload { .. } => 3,
        }
    }
}

impl From<ConfigError> for ForwardError {
    fn from(source: ConfigError) -> Self {
        ForwardError::Configuration { source }
    }
}

impl From<EventError> for ForwardError {
    fn from(source: EventError) -> Self {
        ForwardError::Payload { source }
    }
}

impl From<TestLinkError> for ForwardError {
    fn from(source: TestLinkError) -> Self {
        ForwardError::Submission { source }
    }
}

/// Reads the configured event payload and forwards it to TestLink when it
/// describes an opened, edited or reopened issue.
pub async fn run(state: &State) -> Result<Outcome, ForwardError> {
    let Some(path) = state.config.event_path.as_deref() else {
        info!("No GitHub event payload; exiting (local run?).");
        return Ok(Outcome::NoPayload);
    };

    let Some(event) = events::load_payload(path)? else {
        info!(
            "GitHub event payload `{}` doesn't exist; exiting (local run?).",
            path.display()
        );
        return Ok(Outcome::NoPayload);
    };

    IssuesHandler::new(&event, state).execute().await
}
