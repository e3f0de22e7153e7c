use crate::{ForwardError, Outcome, State};
use derive_more::{Display, Error};
use serde::Deserialize;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

pub mod issues;

#[async_trait::async_trait]
pub trait Handler<'a> {
    fn new(event: &'a IssuesEvent, state: &'a State) -> Self;

    async fn execute(&self) -> Result<Outcome, ForwardError>;
}

#[derive(Debug, Display, Error)]
pub enum EventError {
    #[display("Failed to read event payload `{}`: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[display("Event payload `{}` is not a valid event: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("The `issue` object of the event is malformed: {source}")]
    MalformedIssue { source: serde_json::Error },
}

/// The parts of an `issues` webhook payload the forwarder looks at.
///
/// `issue` is kept as raw JSON and only decoded once the action is known to
/// be handled, so events that are ignored anyway never fail on it.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct IssuesEvent {
    #[serde(default)]
    pub action: Option<IssueAction>,
    #[serde(default)]
    pub issue: Option<serde_json::Value>,
}

impl IssuesEvent {
    pub fn action_name(&self) -> &str {
        self.action.as_ref().map_or("None", IssueAction::as_str)
    }

    pub fn issue(&self) -> Result<Option<Issue>, EventError> {
        self.issue
            .as_ref()
            .map(|issue| Issue::deserialize(issue))
            .transpose()
            .map_err(|source| EventError::MalformedIssue { source })
    }
}

/// Any JSON value is accepted as an action. Only the three handled strings
/// are recognised, everything else ends up in `Other` and is ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "serde_json::Value")]
pub enum IssueAction {
    Opened,
    Edited,
    Reopened,
    Other(String),
}

impl IssueAction {
    pub fn as_str(&self) -> &str {
        match self {
            IssueAction::Opened => "opened",
            IssueAction::Edited => "edited",
            IssueAction::Reopened => "reopened",
            IssueAction::Other(action) => action.as_str(),
        }
    }

    /// Only these actions create or update a requirement
    pub fn is_handled(&self) -> bool {
        !matches!(self, IssueAction::Other(_))
    }

    /// Whether the requirement with the same docid may be overwritten
    pub fn overwrites(&self) -> bool {
        matches!(self, IssueAction::Edited | IssueAction::Reopened)
    }
}

impl From<String> for IssueAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "opened" => IssueAction::Opened,
            "edited" => IssueAction::Edited,
            "reopened" => IssueAction::Reopened,
            _ => IssueAction::Other(action),
        }
    }
}

impl From<serde_json::Value> for IssueAction {
    fn from(action: serde_json::Value) -> Self {
        match action {
            serde_json::Value::String(action) => IssueAction::from(action),
            other => IssueAction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Issue {
    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|label| label.name.as_str()).collect()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Label {
    pub name: String,
}

/// Reads the event payload at `path`. A payload file that doesn't exist is
/// not an error, there is simply nothing to forward.
pub fn load_payload(path: &Path) -> Result<Option<IssuesEvent>, EventError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(EventError::Unreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| EventError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}
