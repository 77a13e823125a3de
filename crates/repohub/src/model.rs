use std::fmt;

use serde::Serialize;

/// Backend-assigned repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entry from a repository file listing.
///
/// `last_modified_raw` keeps the backend's nanosecond timestamp; the tree
/// builder converts it to milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub is_folder: bool,
    pub size: u64,
    pub last_modified_raw: u128,
}

impl FileRecord {
    pub fn file(path: impl Into<String>, size: u64, last_modified_raw: u128) -> Self {
        Self {
            path: path.into(),
            is_folder: false,
            size,
            last_modified_raw,
        }
    }

    pub fn folder(path: impl Into<String>, last_modified_raw: u128) -> Self {
        Self {
            path: path.into(),
            is_folder: true,
            size: 0,
            last_modified_raw,
        }
    }
}

/// Lightweight repository view used in listings and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySummary {
    pub id: RepositoryId,
    pub name: String,
    pub description: Option<String>,
    /// Owner principal as display text, when the backend sent one.
    pub owner: Option<String>,
    pub is_private: bool,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub updated_at: u64,
}

/// Full repository view returned by a single-repository fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDetail {
    pub id: RepositoryId,
    pub name: String,
    pub description: Option<String>,
    /// Owner principal as display text, when the backend sent one.
    pub owner: Option<String>,
    pub is_private: bool,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub license: Option<String>,
    pub default_branch: String,
    pub topics: Vec<String>,
    pub collaborators: Vec<String>,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: u64,
}

impl RepositoryDetail {
    pub fn summary(&self) -> RepositorySummary {
        RepositorySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            owner: self.owner.clone(),
            is_private: self.is_private,
            stars: self.stars,
            forks: self.forks,
            language: self.language.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Page selector for repository listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 0, limit: 20 }
    }
}

/// One page of repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryPage {
    pub repositories: Vec<RepositorySummary>,
    pub total_count: u64,
    pub has_more: bool,
}

/// A file fetched with its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

impl FileContent {
    /// Content as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// A file to be written into a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub path: String,
    pub content: Vec<u8>,
}

/// Which kinds of results a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    All,
    Repositories,
    Files,
}

impl SearchScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "repo" | "repos" | "repositories" => Some(Self::Repositories),
            "file" | "files" | "code" => Some(Self::Files),
            _ => None,
        }
    }

    pub fn includes_repositories(self) -> bool {
        matches!(self, Self::All | Self::Repositories)
    }

    pub fn includes_files(self) -> bool {
        matches!(self, Self::All | Self::Files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub scope: SearchScope,
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            scope: SearchScope::All,
            limit: None,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A file path that matched a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatch {
    pub repository_id: RepositoryId,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchResults {
    pub repositories: Vec<RepositorySummary>,
    pub files: Vec<FileMatch>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parse_accepts_aliases() {
        assert_eq!(SearchScope::parse("repos"), Some(SearchScope::Repositories));
        assert_eq!(SearchScope::parse("CODE"), Some(SearchScope::Files));
        assert_eq!(SearchScope::parse("all"), Some(SearchScope::All));
        assert_eq!(SearchScope::parse("users"), None);
    }

    #[test]
    fn scope_membership() {
        assert!(SearchScope::All.includes_files());
        assert!(SearchScope::All.includes_repositories());
        assert!(!SearchScope::Files.includes_repositories());
        assert!(!SearchScope::Repositories.includes_files());
    }

    #[test]
    fn file_content_text_requires_utf8() {
        let text = FileContent {
            path: "a.txt".into(),
            content: b"hello".to_vec(),
            size: 5,
            last_modified: 0,
        };
        assert_eq!(text.text(), Some("hello"));

        let binary = FileContent {
            content: vec![0xff, 0xfe],
            ..text
        };
        assert_eq!(binary.text(), None);
    }
}
