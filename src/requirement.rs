//! Derivation of a TestLink requirement from an issue.
//!
//! Labels drive two of the fields:
//! - `tests:N` sets the expected test case coverage to `N`
//! - `reqstatus:<status>` or a bare `<status>` label sets the status, where
//!   `<status>` is one of `draft`, `finish`, `review` or `valid`
//!
//! Both scans walk the labels in order and stop at the first label that
//! yields a value. Labels that can't be interpreted are skipped.

use crate::{
    common::escape_html,
    events::{Issue, IssueAction},
    DOCID_PREFIX,
};

pub static DEFAULT_EXPECTED_COVERAGE: i64 = 1;
pub static COVERAGE_LABEL_PREFIX: &str = "tests:";
pub static STATUS_LABEL_MARKER: &str = "reqstatus:";

/// A rule looks at a single label and may derive a value from it.
pub type LabelRule<T> = fn(&str) -> Option<T>;

pub static COVERAGE_RULES: &[LabelRule<i64>] = &[coverage_label];
pub static STATUS_RULES: &[LabelRule<RequirementStatus>] =
    &[prefixed_status_label, bare_status_label];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequirementStatus {
    #[default]
    Draft,
    Finish,
    Review,
    Valid,
}

impl RequirementStatus {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "draft" => Some(RequirementStatus::Draft),
            "finish" => Some(RequirementStatus::Finish),
            "review" => Some(RequirementStatus::Review),
            "valid" => Some(RequirementStatus::Valid),
            _ => None,
        }
    }

    /// Single letter code TestLink stores
    pub fn code(self) -> &'static str {
        match self {
            RequirementStatus::Draft => "D",
            RequirementStatus::Finish => "F",
            RequirementStatus::Review => "R",
            RequirementStatus::Valid => "V",
        }
    }
}

/// TestLink's built-in requirement types, with their API ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementType {
    Info = 1,
    Feature = 2,
    UseCase = 3,
    Interface = 4,
    NonFunctional = 5,
    Constraint = 6,
    SystemFunction = 7,
}

impl RequirementType {
    pub fn id(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRecord {
    pub docid: String,
    pub title: String,
    /// HTML description, TestLink calls it the scope
    pub scope: String,
    pub status: RequirementStatus,
    pub req_type: RequirementType,
    pub expected_coverage: i64,
    /// Replace an existing requirement with the same docid
    pub overwrite: bool,
}

impl RequirementRecord {
    pub fn from_issue(issue: &Issue, action: &IssueAction) -> Self {
        let labels = issue.label_names();

        Self {
            docid: docid(issue.number),
            title: match issue.title.as_deref() {
                Some(title) if !title.is_empty() => title.to_owned(),
                _ => format!("Issue #{}", issue.number),
            },
            scope: scope_html(issue.body.as_deref().unwrap_or_default(), &issue.html_url),
            status: first_match(&labels, STATUS_RULES).unwrap_or_default(),
            req_type: RequirementType::UseCase,
            expected_coverage: first_match(&labels, COVERAGE_RULES)
                .unwrap_or(DEFAULT_EXPECTED_COVERAGE),
            overwrite: action.overwrites(),
        }
    }
}

pub fn docid(issue_number: u64) -> String {
    format!("{}{}", DOCID_PREFIX, issue_number)
}

/// Body paragraph followed by a paragraph linking back to the issue.
pub fn scope_html(body: &str, url: &str) -> String {
    let url = escape_html(url);
    format!(
        "<p>{}</p><p>Source: <a href='{url}'>{url}</a></p>",
        escape_html(body).replace('\n', "<br>")
    )
}

/// Applies `rules` to each label in order and returns the first value any
/// rule derives.
pub fn first_match<T>(labels: &[&str], rules: &[LabelRule<T>]) -> Option<T> {
    labels
        .iter()
        .find_map(|label| rules.iter().find_map(|rule| rule(label)))
}

fn coverage_label(label: &str) -> Option<i64> {
    label
        .to_lowercase()
        .strip_prefix(COVERAGE_LABEL_PREFIX)?
        .trim()
        .parse()
        .ok()
}

fn prefixed_status_label(label: &str) -> Option<RequirementStatus> {
    let label = label.to_lowercase();
    if !label.contains(STATUS_LABEL_MARKER) {
        return None;
    }
    RequirementStatus::from_key(label.rsplit(':').next()?.trim())
}

fn bare_status_label(label: &str) -> Option<RequirementStatus> {
    let label = label.to_lowercase();
    if label.contains(STATUS_LABEL_MARKER) {
        return None;
    }
    RequirementStatus::from_key(&label)
}
