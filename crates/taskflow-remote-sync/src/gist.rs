//! GitHub Gist remote store.
//!
//! The two documents live as two files of one gist. A single `PATCH`
//! replaces both files, so a push is atomic on the remote side. Requests
//! are blocking (ureq) and run on tokio's blocking pool.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use taskflow_remote_core::{RemoteSnapshot, VersionToken, EMPTY_COLLECTION};
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::remote::RemoteStore;
use crate::wire::{
    CreateGistRequest, FileContent, GistFile, GistResponse, UpdateGistRequest, GIST_DESCRIPTION,
};

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "TASKFLOW_GIST_TOKEN";

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "taskflow-remote";
const ACCEPT: &str = "application/vnd.github+json";

/// Connection settings for the gist remote.
#[derive(Clone)]
pub struct GistConfig {
    /// API base URL without trailing slash.
    pub api_base: String,
    /// Access token. Empty means not configured.
    pub token: String,
    /// Gist file name of the main document.
    pub main_file: String,
    /// Gist file name of the archive document.
    pub archive_file: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GistConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: String::new(),
            main_file: "tasks.yaml".to_string(),
            archive_file: "tasks.archive.yaml".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for GistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GistConfig")
            .field("api_base", &self.api_base)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("main_file", &self.main_file)
            .field("archive_file", &self.archive_file)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GistConfig {
    /// Defaults with the token read from [`TOKEN_ENV`].
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).unwrap_or_default();
        let config = Self {
            token,
            ..Self::default()
        };
        config.require_token()?;
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    fn require_token(&self) -> Result<&str> {
        if self.token.is_empty() {
            return Err(SyncError::CredentialMissing { env: TOKEN_ENV });
        }
        Ok(&self.token)
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.api_base, id)
    }

    fn agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
    }
}

/// A gist holding both documents.
#[derive(Clone)]
pub struct GistRemote {
    config: GistConfig,
    gist_id: String,
    agent: ureq::Agent,
}

impl fmt::Debug for GistRemote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GistRemote")
            .field("config", &self.config)
            .field("gist_id", &self.gist_id)
            .finish()
    }
}

impl GistRemote {
    pub fn new(config: GistConfig, gist_id: impl Into<String>) -> Self {
        let agent = config.agent();
        Self {
            config,
            gist_id: gist_id.into(),
            agent,
        }
    }

    pub fn gist_id(&self) -> &str {
        &self.gist_id
    }

    pub fn config(&self) -> &GistConfig {
        &self.config
    }

    /// Create a new gist seeded with two empty collections.
    ///
    /// Returns the id of the new gist.
    pub async fn create(config: &GistConfig, public: bool) -> Result<String> {
        config.require_token()?;
        let config = config.clone();
        let id = tokio::task::spawn_blocking(move || {
            let agent = config.agent();
            post_gist(&agent, &config, public)
        })
        .await??;
        info!(gist_id = %id, public, "created gist");
        Ok(id)
    }
}

#[async_trait]
impl RemoteStore for GistRemote {
    async fn fetch(&self) -> Result<RemoteSnapshot> {
        self.config.require_token()?;
        let (agent, config, id) = (self.agent.clone(), self.config.clone(), self.gist_id.clone());
        let snapshot = tokio::task::spawn_blocking(move || {
            let resp = get_gist(&agent, &config, &id)?;
            snapshot_from_response(&agent, &config, &resp)
        })
        .await??;
        debug!(gist_id = %self.gist_id, version = %snapshot.version, "fetched gist");
        Ok(snapshot)
    }

    async fn push(&self, main: &Bytes, archive: &Bytes) -> Result<VersionToken> {
        self.config.require_token()?;
        let main = utf8(main, "main")?;
        let archive = utf8(archive, "archive")?;
        let (agent, config, id) = (self.agent.clone(), self.config.clone(), self.gist_id.clone());
        let version = tokio::task::spawn_blocking(move || {
            patch_gist(&agent, &config, &id, &main, &archive)
        })
        .await??;
        debug!(gist_id = %self.gist_id, version = %version, "patched gist");
        Ok(version)
    }
}

fn utf8(bytes: &Bytes, which: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| SyncError::InvalidContent(format!("{which} document is not UTF-8: {e}")))
}

fn get_gist(agent: &ureq::Agent, config: &GistConfig, id: &str) -> Result<GistResponse> {
    let token = config.require_token()?;
    let resp = agent
        .get(&config.gist_url(id))
        .set("Authorization", &format!("token {token}"))
        .set("Accept", ACCEPT)
        .call()
        .map_err(|e| map_ureq_error("fetch", e))?;
    let body = read_body("fetch", resp, 200)?;
    serde_json::from_str(&body).map_err(|e| SyncError::decode("fetch", e))
}

fn patch_gist(
    agent: &ureq::Agent,
    config: &GistConfig,
    id: &str,
    main: &str,
    archive: &str,
) -> Result<VersionToken> {
    let token = config.require_token()?;
    let request = UpdateGistRequest::pair(&config.main_file, main, &config.archive_file, archive);
    let payload = serde_json::to_string(&request).map_err(|e| SyncError::decode("push", e))?;

    let resp = agent
        .request("PATCH", &config.gist_url(id))
        .set("Authorization", &format!("token {token}"))
        .set("Accept", ACCEPT)
        .set("Content-Type", "application/json")
        .send_string(&payload)
        .map_err(|e| map_ureq_error("push", e))?;
    let body = read_body("push", resp, 200)?;
    let gist: GistResponse = serde_json::from_str(&body).map_err(|e| SyncError::decode("push", e))?;
    Ok(gist.latest_version())
}

fn post_gist(agent: &ureq::Agent, config: &GistConfig, public: bool) -> Result<String> {
    let token = config.require_token()?;
    let empty = std::str::from_utf8(EMPTY_COLLECTION).unwrap_or("tasks: []\n");
    let mut files = BTreeMap::new();
    files.insert(config.main_file.as_str(), FileContent { content: empty });
    files.insert(config.archive_file.as_str(), FileContent { content: empty });
    let request = CreateGistRequest {
        description: GIST_DESCRIPTION,
        public,
        files,
    };
    let payload = serde_json::to_string(&request).map_err(|e| SyncError::decode("create", e))?;

    let resp = agent
        .post(&format!("{}/gists", config.api_base))
        .set("Authorization", &format!("token {token}"))
        .set("Accept", ACCEPT)
        .set("Content-Type", "application/json")
        .send_string(&payload)
        .map_err(|e| map_ureq_error("create", e))?;
    let body = read_body("create", resp, 201)?;
    let gist: GistResponse =
        serde_json::from_str(&body).map_err(|e| SyncError::decode("create", e))?;
    if gist.id.is_empty() {
        return Err(SyncError::decode("create", "no gist id returned"));
    }
    Ok(gist.id)
}

fn read_body(op: &'static str, resp: ureq::Response, expected: u16) -> Result<String> {
    let status = resp.status();
    let mut body = String::new();
    resp.into_reader()
        .read_to_string(&mut body)
        .map_err(|e| SyncError::network(op, Some(status), format!("failed to read body: {e}")))?;
    if status != expected {
        return Err(SyncError::network(op, Some(status), body));
    }
    Ok(body)
}

fn map_ureq_error(op: &'static str, err: ureq::Error) -> SyncError {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            SyncError::network(op, Some(code), body)
        }
        ureq::Error::Transport(t) => SyncError::network(op, None, t.to_string()),
    }
}

/// Build a snapshot from a gist, re-reading truncated files from `raw_url`.
fn snapshot_from_response(
    agent: &ureq::Agent,
    config: &GistConfig,
    resp: &GistResponse,
) -> Result<RemoteSnapshot> {
    let main = file_content(agent, config, resp.file(&config.main_file))?.unwrap_or_default();
    let archive = file_content(agent, config, resp.file(&config.archive_file))?
        .filter(|a| !a.is_empty())
        .map(Bytes::from)
        .unwrap_or_else(|| Bytes::from_static(EMPTY_COLLECTION));
    Ok(RemoteSnapshot::new(main, archive, resp.latest_version()))
}

fn file_content(
    agent: &ureq::Agent,
    config: &GistConfig,
    file: Option<&GistFile>,
) -> Result<Option<String>> {
    let Some(file) = file else {
        return Ok(None);
    };
    match (&file.raw_url, file.truncated) {
        (Some(raw_url), true) => {
            let token = config.require_token()?;
            let resp = agent
                .get(raw_url)
                .set("Authorization", &format!("token {token}"))
                .call()
                .map_err(|e| map_ureq_error("fetch", e))?;
            read_body("fetch", resp, 200).map(Some)
        }
        _ => Ok(Some(file.content.clone().unwrap_or_default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GistConfig {
        GistConfig::default().with_token("secret")
    }

    fn parse(body: &str) -> GistResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_snapshot_from_response() {
        let config = config();
        let resp = parse(
            r#"{"files": {
                "tasks.yaml": {"content": "tasks:\n- a\n"},
                "tasks.archive.yaml": {"content": "tasks:\n- old\n"}
            }, "history": [{"version": "v7"}]}"#,
        );
        let snap = snapshot_from_response(&config.agent(), &config, &resp).unwrap();

        assert_eq!(&snap.main[..], b"tasks:\n- a\n");
        assert_eq!(&snap.archive[..], b"tasks:\n- old\n");
        assert_eq!(snap.version.as_str(), "v7");
    }

    #[test]
    fn test_missing_files_use_defaults() {
        let config = config();
        let resp = parse(r#"{"files": {"tasks.archive.yaml": {"content": ""}}}"#);
        let snap = snapshot_from_response(&config.agent(), &config, &resp).unwrap();

        assert!(snap.main.is_empty());
        assert_eq!(&snap.archive[..], EMPTY_COLLECTION);
        assert!(snap.version.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        let config = GistConfig::default().with_api_base("http://127.0.0.1:1");
        let remote = GistRemote::new(config.clone(), "abc");

        assert!(matches!(
            remote.fetch().await,
            Err(SyncError::CredentialMissing { env: TOKEN_ENV })
        ));
        let doc = Bytes::from_static(b"tasks: []\n");
        assert!(matches!(
            remote.push(&doc, &doc).await,
            Err(SyncError::CredentialMissing { .. })
        ));
        assert!(matches!(
            GistRemote::create(&config, false).await,
            Err(SyncError::CredentialMissing { .. })
        ));
    }

    #[test]
    fn test_status_error_keeps_body() {
        let resp =
            ureq::Response::new(401, "Unauthorized", r#"{"message":"Bad credentials"}"#).unwrap();
        let err = map_ureq_error("fetch", ureq::Error::Status(401, resp));

        match err {
            SyncError::Network { op, status, message } => {
                assert_eq!(op, "fetch");
                assert_eq!(status, Some(401));
                assert!(message.contains("Bad credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let printed = format!("{:?}", config());
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let config = GistConfig::default().with_api_base("http://localhost:8080/");
        assert_eq!(config.gist_url("g1"), "http://localhost:8080/gists/g1");
    }
}
