//! Gist API request and response bodies.
//!
//! Only the fields the sync engine reads are modelled. Unknown fields are
//! ignored.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use taskflow_remote_core::VersionToken;

/// Description given to newly created gists.
pub const GIST_DESCRIPTION: &str = "TaskFlow task storage";

/// A gist as returned by `GET`, `PATCH` and `POST`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GistResponse {
    #[serde(default)]
    pub id: String,
    /// Files by name. Deleted files may come back as `null`.
    #[serde(default)]
    pub files: HashMap<String, Option<GistFile>>,
    /// Revisions, newest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl GistResponse {
    /// Version of the newest revision, or the empty token.
    pub fn latest_version(&self) -> VersionToken {
        self.history
            .first()
            .map(|h| VersionToken::new(h.version.clone()))
            .unwrap_or_default()
    }

    pub fn file(&self, name: &str) -> Option<&GistFile> {
        self.files.get(name).and_then(Option::as_ref)
    }
}

/// One file within a gist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub content: Option<String>,
    /// Set when `content` was cut short and must be read from `raw_url`.
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub raw_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub version: String,
    #[serde(default)]
    pub committed_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileContent<'a> {
    pub content: &'a str,
}

/// Body of a `PATCH /gists/{id}` replacing both documents.
#[derive(Debug, Serialize)]
pub struct UpdateGistRequest<'a> {
    pub files: BTreeMap<&'a str, FileContent<'a>>,
}

impl<'a> UpdateGistRequest<'a> {
    pub fn pair(
        main_file: &'a str,
        main: &'a str,
        archive_file: &'a str,
        archive: &'a str,
    ) -> Self {
        let mut files = BTreeMap::new();
        files.insert(main_file, FileContent { content: main });
        files.insert(archive_file, FileContent { content: archive });
        Self { files }
    }
}

/// Body of a `POST /gists`.
#[derive(Debug, Serialize)]
pub struct CreateGistRequest<'a> {
    pub description: &'a str,
    pub public: bool,
    pub files: BTreeMap<&'a str, FileContent<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gist_response() {
        let body = r#"{
            "id": "abc123",
            "files": {
                "tasks.yaml": {"content": "tasks:\n- a\n", "truncated": false, "raw_url": "https://x/raw"},
                "old.yaml": null
            },
            "history": [{"version": "v2", "committed_at": "2024-01-02T00:00:00Z"}, {"version": "v1"}],
            "owner": {"login": "someone"}
        }"#;
        let resp: GistResponse = serde_json::from_str(body).unwrap();

        assert_eq!(resp.id, "abc123");
        assert_eq!(resp.latest_version().as_str(), "v2");
        assert_eq!(
            resp.file("tasks.yaml").and_then(|f| f.content.as_deref()),
            Some("tasks:\n- a\n")
        );
        assert!(resp.file("old.yaml").is_none());
        assert!(resp.file("tasks.archive.yaml").is_none());
    }

    #[test]
    fn test_no_history_is_empty_version() {
        let resp: GistResponse = serde_json::from_str(r#"{"files": {}}"#).unwrap();
        assert!(resp.latest_version().is_empty());
    }

    #[test]
    fn test_update_body_shape() {
        let req = UpdateGistRequest::pair(
            "tasks.yaml",
            "tasks: []\n",
            "tasks.archive.yaml",
            "tasks: []\n",
        );
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["files"]["tasks.yaml"]["content"], "tasks: []\n");
        assert_eq!(json["files"]["tasks.archive.yaml"]["content"], "tasks: []\n");
    }
}
