//! Typed views of the GitHub payloads the relay sees most often.
//!
//! These are only used to enrich log lines. The relay forwards the payload
//! unchanged, so a payload that does not match these shapes is not an error.

use serde::{de::IgnoredAny, Deserialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    full_name: String,
}

/// `push` event payload.
#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    after: String,
    repository: GitHubRepository,
    #[serde(default)]
    sender: Option<GitHubUser>,
    /// Only counted.
    #[serde(default)]
    commits: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    head: GitRef,
}

/// `pull_request` event payload.
#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: String,
    number: u64,
    pull_request: PullRequest,
    repository: GitHubRepository,
    #[serde(default)]
    sender: Option<GitHubUser>,
}

/// Fields present on nearly every event.
#[derive(Debug, Deserialize)]
struct GenericPayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    repository: Option<GitHubRepository>,
    #[serde(default)]
    sender: Option<GitHubUser>,
}

/// What a delivery is about, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub repository: Option<String>,
    pub sender: Option<String>,
    pub action: Option<String>,
    pub git_ref: Option<String>,
    pub head_sha: Option<String>,
    pub pull_request: Option<u64>,
    pub commit_count: Option<usize>,
}

impl EventSummary {
    /// Summarize a payload. Unknown or malformed payloads yield whatever
    /// common fields could be read.
    pub fn from_payload(event: Option<&str>, payload: &Value) -> Self {
        match event {
            Some("push") => {
                if let Ok(push) = PushPayload::deserialize(payload) {
                    return Self {
                        repository: Some(push.repository.full_name),
                        sender: push.sender.map(|s| s.login),
                        action: None,
                        git_ref: Some(push.git_ref),
                        head_sha: Some(push.after),
                        pull_request: None,
                        commit_count: Some(push.commits.len()),
                    };
                }
            }
            Some("pull_request") => {
                if let Ok(pr) = PullRequestPayload::deserialize(payload) {
                    return Self {
                        repository: Some(pr.repository.full_name),
                        sender: pr.sender.map(|s| s.login),
                        action: Some(pr.action),
                        git_ref: Some(pr.pull_request.head.git_ref),
                        head_sha: Some(pr.pull_request.head.sha),
                        pull_request: Some(pr.number),
                        commit_count: None,
                    };
                }
            }
            _ => {}
        }

        match GenericPayload::deserialize(payload) {
            Ok(generic) => Self {
                repository: generic.repository.map(|r| r.full_name),
                sender: generic.sender.map(|s| s.login),
                action: generic.action,
                ..Default::default()
            },
            Err(_) => Self::default(),
        }
    }
}
