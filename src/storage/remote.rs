//! Contents-API backend: the whole event log lives in one JSON file of a
//! hosted repository, written with optimistic concurrency on the file's
//! revision (`sha`).

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RemoteConfig;
use crate::errors::{Result, StoreError};
use crate::models::Snapshot;

const USER_AGENT: &str = concat!("habit-tracker/", env!("CARGO_PKG_VERSION"));

/// Response from GET /repos/{owner}/{repo}/contents/{path}
#[derive(Debug, Deserialize)]
struct ContentsFile {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Response from PUT /repos/{owner}/{repo}/contents/{path}
#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

#[derive(Debug, Clone)]
pub struct RemoteStore {
    http_client: reqwest::Client,
    url: String,
    branch: Option<String>,
}

impl RemoteStore {
    /// Fails with `ConfigurationMissing` unless token, owner and repo are set.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        config.validate()?;
        let (Some(token), Some(owner), Some(repo)) = (&config.token, &config.owner, &config.repo)
        else {
            return Err(StoreError::ConfigurationMissing(
                "remote token, owner and repo are required".to_string(),
            ));
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            StoreError::ConfigurationMissing(format!("invalid remote token: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to create HTTP client: {e}")))?;

        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            config.api_base.trim_end_matches('/'),
            owner,
            repo,
            config.path.trim_start_matches('/')
        );

        Ok(Self {
            http_client,
            url,
            branch: config.branch.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reads the file, creating it with an empty log when it does not exist.
    pub async fn load(&self) -> Result<Snapshot> {
        match self.fetch().await {
            Ok(snapshot) => Ok(snapshot),
            Err(StoreError::NotFound(_)) => {
                info!(url = %self.url, "remote file missing, initializing empty log");
                let revision = self
                    .put(&Snapshot::default(), None, "Initialize habit log")
                    .await?;
                Ok(Snapshot {
                    entries: Vec::new(),
                    revision: Some(revision),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Writes `snapshot` against its revision and returns the new one.
    pub async fn save(&self, snapshot: &Snapshot, message: &str) -> Result<Option<String>> {
        let revision = self
            .put(snapshot, snapshot.revision.as_deref(), message)
            .await?;
        Ok(Some(revision))
    }

    async fn fetch(&self) -> Result<Snapshot> {
        let mut request = self.http_client.get(&self.url);
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }
        let response = request.send().await.map_err(transport)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(self.url.clone()));
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let file: ContentsFile = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("failed to parse response: {e}")))?;
        let compact: String = file.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| StoreError::Transport(format!("invalid base64 content: {e}")))?;
        let mut snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Transport(format!("remote file is not a habit log: {e}")))?;
        snapshot.revision = Some(file.sha);
        Ok(snapshot)
    }

    async fn put(&self, snapshot: &Snapshot, revision: Option<&str>, message: &str) -> Result<String> {
        let document = Snapshot {
            entries: snapshot.entries.clone(),
            revision: None,
        };
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(serde_json::to_vec_pretty(&document)?),
            sha: revision,
            branch: self.branch.as_deref(),
        };

        let response = self
            .http_client
            .put(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            warn!(url = %self.url, revision = ?revision, "remote rejected stale revision");
            return Err(StoreError::Conflict(format!(
                "remote file changed since revision {}; reload and retry",
                revision.unwrap_or("<none>")
            )));
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let saved: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("failed to parse response: {e}")))?;
        Ok(saved.content.sha)
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Transport(format!("request timed out: {err}"))
    } else {
        StoreError::Transport(format!("HTTP request failed: {err}"))
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> StoreError {
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    warn!(%status, "remote storage request failed");
    StoreError::Transport(format!("API error ({status}): {error_text}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            token: Some("secret".into()),
            owner: Some("someone".into()),
            repo: Some("habits".into()),
            path: "/data/habits.json".into(),
            branch: None,
            api_base: "https://api.example.test/".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn builds_contents_url() {
        let store = RemoteStore::new(&config()).unwrap();
        assert_eq!(
            store.url(),
            "https://api.example.test/repos/someone/habits/contents/data/habits.json"
        );
    }

    #[test]
    fn incomplete_credentials_are_rejected() {
        let mut config = config();
        config.token = None;
        let err = RemoteStore::new(&config).unwrap_err();
        assert!(matches!(err, StoreError::ConfigurationMissing(_)));
    }
}
