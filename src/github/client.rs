use std::sync::OnceLock;

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::github::http::{ApiError, RateLimitState, RestClient, API_BASE_URL};
use crate::llm::TextGenerator;
use crate::models::github::{
    Comment, Issue, PullFile, PullRequest, RateLimit, Repo, User,
};
use crate::personality::{strip_flavor_line, PersonalityEngine};

/// First line of the single progress comment maintained per pull request
pub const PROGRESS_HEADER: &str = "## Progress Update";

#[derive(Debug, Error)]
#[error("invalid GitHub repository URL: {0}")]
pub struct InvalidUrlError(pub String);

/// HTTPS and SSH repository URL patterns, compiled once per process
static URL_PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();

fn url_patterns() -> &'static [Regex; 2] {
    URL_PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^https?://github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$").unwrap(),
            Regex::new(r"^git@github\.com:([^/]+)/([^/]+?)(?:\.git)?/?$").unwrap(),
        ]
    })
}

/// Typed operations over the GitHub Issues/Pulls REST API.
///
/// Owns the rate-limited REST client and the personality engine; comment
/// and PR bodies pass through personality exactly once, inside the
/// primitive create/update operations.
pub struct GitHubClient {
    rest: RestClient,
    config: Config,
    token: String,
    personality: PersonalityEngine,
}

impl GitHubClient {
    /// Build a client, resolving the token (explicit > env > config file)
    /// and merging any explicit config overrides onto the defaults.
    pub fn new(
        token: Option<&str>,
        overrides: Option<Value>,
        generator: Option<Box<dyn TextGenerator>>,
    ) -> Result<Self> {
        let (token, config) = Config::resolve(token, overrides, None)?;
        let base_url = config.api_url.as_deref().unwrap_or(API_BASE_URL);
        let rest = RestClient::with_base_url(&token, base_url)?;
        let personality = PersonalityEngine::new(config.personality.enabled, generator);

        Ok(Self {
            rest,
            config,
            token,
            personality,
        })
    }

    /// The resolved API token (the orchestrator needs it for clone URLs)
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Quota state observed on the most recent response
    pub fn rate_limit_state(&self) -> &RateLimitState {
        self.rest.rate_limit()
    }

    /// Parse owner and repo out of an HTTPS or SSH GitHub repository URL.
    pub fn parse_repo_url(url: &str) -> Result<(String, String), InvalidUrlError> {
        for re in url_patterns() {
            if let Some(captures) = re.captures(url) {
                return Ok((captures[1].to_string(), captures[2].to_string()));
            }
        }

        Err(InvalidUrlError(url.to_string()))
    }

    // --- reads ---

    pub fn get_rate_limit(&mut self) -> Result<RateLimit, ApiError> {
        let value = self.rest.get("/rate_limit", &[])?;
        let core = value
            .pointer("/resources/core")
            .cloned()
            .unwrap_or(value);
        Ok(serde_json::from_value(core)?)
    }

    pub fn get_current_user(&mut self) -> Result<User, ApiError> {
        let value = self.rest.get("/user", &[])?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn list_repos(&mut self, per_page: Option<u32>) -> Result<Vec<Repo>, ApiError> {
        let per_page = self.config.rate_limit.clamp_per_page(per_page);
        let params = [("per_page", per_page.to_string())];
        let value = self.rest.get("/user/repos", &params)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn list_issues(
        &mut self,
        owner: &str,
        repo: &str,
        state: &str,
        per_page: Option<u32>,
    ) -> Result<Vec<Issue>, ApiError> {
        let per_page = self.config.rate_limit.clamp_per_page(per_page);
        let params = [
            ("state", state.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let value = self
            .rest
            .get(&format!("/repos/{}/{}/issues", owner, repo), &params)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn get_issue(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Issue, ApiError> {
        let value = self
            .rest
            .get(&format!("/repos/{}/{}/issues/{}", owner, repo, number), &[])?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn list_issue_comments(
        &mut self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        per_page: Option<u32>,
    ) -> Result<Vec<Comment>, ApiError> {
        let per_page = self.config.rate_limit.clamp_per_page(per_page);
        let params = [("per_page", per_page.to_string())];
        let value = self.rest.get(
            &format!("/repos/{}/{}/issues/{}/comments", owner, repo, issue_number),
            &params,
        )?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn list_pulls(
        &mut self,
        owner: &str,
        repo: &str,
        state: &str,
        per_page: Option<u32>,
    ) -> Result<Vec<PullRequest>, ApiError> {
        let per_page = self.config.rate_limit.clamp_per_page(per_page);
        let params = [
            ("state", state.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let value = self
            .rest
            .get(&format!("/repos/{}/{}/pulls", owner, repo), &params)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn list_pull_files(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullFile>, ApiError> {
        let value = self.rest.get(
            &format!("/repos/{}/{}/pulls/{}/files", owner, repo, number),
            &[],
        )?;
        Ok(serde_json::from_value(value)?)
    }

    // --- mutations ---

    pub fn create_issue(
        &mut self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<Issue, ApiError> {
        let payload = json!({
            "title": title,
            "body": body,
            "labels": labels,
        });
        let value = self
            .rest
            .post(&format!("/repos/{}/{}/issues", owner, repo), &payload)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn update_issue(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        title: Option<&str>,
        body: Option<&str>,
        state: Option<&str>,
    ) -> Result<Issue, ApiError> {
        let mut payload = serde_json::Map::new();
        if let Some(title) = title {
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(body) = body {
            payload.insert("body".to_string(), json!(body));
        }
        if let Some(state) = state {
            payload.insert("state".to_string(), json!(state));
        }
        let value = self.rest.patch(
            &format!("/repos/{}/{}/issues/{}", owner, repo, number),
            &Value::Object(payload),
        )?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn create_pull_request(
        &mut self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, ApiError> {
        let body = self.decorate(body, "pull request description");
        let payload = json!({
            "title": title,
            "body": body,
            "head": head,
            "base": base,
        });
        let value = self
            .rest
            .post(&format!("/repos/{}/{}/pulls", owner, repo), &payload)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn update_pull_request(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<PullRequest, ApiError> {
        let mut payload = serde_json::Map::new();
        if let Some(title) = title {
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(body) = body {
            let body = self.decorate(body, "pull request description");
            payload.insert("body".to_string(), json!(body));
        }
        let value = self.rest.patch(
            &format!("/repos/{}/{}/pulls/{}", owner, repo, number),
            &Value::Object(payload),
        )?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn create_comment(
        &mut self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> Result<Comment, ApiError> {
        let body = self.decorate(body, "comment");
        let value = self.rest.post(
            &format!("/repos/{}/{}/issues/{}/comments", owner, repo, issue_number),
            &json!({ "body": body }),
        )?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn update_comment(
        &mut self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<Comment, ApiError> {
        let body = self.decorate(body, "comment");
        let value = self.rest.patch(
            &format!("/repos/{}/{}/issues/comments/{}", owner, repo, comment_id),
            &json!({ "body": body }),
        )?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn delete_repo(&mut self, owner: &str, repo: &str) -> Result<(), ApiError> {
        self.rest.delete(&format!("/repos/{}/{}", owner, repo))?;
        Ok(())
    }

    /// Report progress on a pull request, keeping at most one progress
    /// comment: an existing header-marked comment is overwritten (latest
    /// progress wins), otherwise a new comment is created.
    ///
    /// Personality is applied by the delegated comment primitive, never
    /// here.
    pub fn update_progress(
        &mut self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        changes: &[String],
    ) -> Result<Comment, ApiError> {
        let body = build_progress_body(changes);

        let comments = self.list_issue_comments(owner, repo, pr_number, None)?;
        match find_progress_comment(&comments) {
            Some(comment_id) => {
                info!("Overwriting progress comment {} on PR #{}", comment_id, pr_number);
                self.update_comment(owner, repo, comment_id, &body)
            }
            None => {
                info!("Creating progress comment on PR #{}", pr_number);
                self.create_comment(owner, repo, pr_number, &body)
            }
        }
    }

    // --- personality plumbing ---

    /// Run an outgoing body through the personality engine, lazily
    /// fetching the personality document on first use.
    fn decorate(&mut self, text: &str, context_hint: &str) -> String {
        if self.personality.needs_load() {
            self.load_personality();
        }
        self.personality.apply(text, context_hint)
    }

    /// Fetch the README of the conventional companion repository
    /// (`<login>/<login>-personality`). Failures are logged and cached;
    /// the engine then stays an identity transform.
    fn load_personality(&mut self) {
        let login = match self.get_current_user() {
            Ok(user) => user.login,
            Err(e) => {
                warn!("Could not resolve user for personality document: {}", e);
                self.personality.install_document(None, None);
                return;
            }
        };

        let path = format!("/repos/{}/{}-personality/readme", login, login);
        match self.rest.get_raw(&path, "application/vnd.github.raw") {
            Ok(document) => {
                info!("Loaded personality document from {}-personality", login);
                self.personality
                    .install_document(Some(login), Some(document));
            }
            Err(e) => {
                warn!("Personality document unavailable, continuing without: {}", e);
                self.personality.install_document(Some(login), None);
            }
        }
    }
}

/// Build the progress comment body: header, timestamp, change bullets.
pub fn build_progress_body(changes: &[String]) -> String {
    let mut body = format!(
        "{}\n\nLast updated: {}\n",
        PROGRESS_HEADER,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    if !changes.is_empty() {
        body.push('\n');
        for change in changes {
            body.push_str(&format!("- {}\n", change));
        }
    }
    body
}

/// Find the progress comment among a PR's comments. A personality flavor
/// line may sit above the header, so it is stripped before matching.
pub fn find_progress_comment(comments: &[Comment]) -> Option<u64> {
    comments
        .iter()
        .find(|c| strip_flavor_line(&c.body).starts_with(PROGRESS_HEADER))
        .map(|c| c.id)
}
