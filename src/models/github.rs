use serde::{Deserialize, Serialize};

/// A label attached to an issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A GitHub issue, reduced to the fields this crate consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,

    pub title: String,

    /// Issue body; GitHub returns null for issues opened with no body
    pub body: Option<String>,

    pub html_url: String,

    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub state: Option<String>,
}

/// A comment on an issue or pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,

    #[serde(default)]
    pub body: String,
}

/// A pull request, reduced to the fields this crate consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,

    pub html_url: String,

    pub title: String,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub state: Option<String>,
}

/// A file changed by a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullFile {
    pub filename: String,

    #[serde(default)]
    pub status: Option<String>,
}

/// The authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// A repository owned by the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,

    pub full_name: String,

    #[serde(default)]
    pub private: bool,
}

/// Core quota numbers from the rate limit endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u32,

    pub remaining: u32,

    /// Epoch second at which the quota window resets
    pub reset: u64,
}
