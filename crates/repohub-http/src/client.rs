use std::time::Duration;

use base64::Engine;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;

use repohub::normalize::{Normalized, Normalizer};
use repohub::wire::{
    WireFile, WireFileEntry, WireRepository, WireRepositoryPage, WireResult, WireSearchResults,
};
use repohub::{
    Backend, BackendError, FileContent, FileRecord, FileUpload, Pagination, RepositoryDetail,
    RepositoryId, RepositoryPage, SearchQuery, SearchResults, SearchScope, Session,
};

use crate::retry::{AttemptError, RetryPolicy, with_retry};

/// Configuration for a canister gateway client.
#[derive(Debug, Clone)]
pub struct CanisterClientConfig {
    /// Gateway root, e.g. `https://gateway.example/canister/abcde-aaaab`.
    pub base_url: String,
    pub label: String,
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl CanisterClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            label: "canister".into(),
            timeout: Some(Duration::from_secs(30)),
            retry: RetryPolicy::default(),
        }
    }
}

/// Read calls go to `/query`, state-changing calls to `/update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Query,
    Update,
}

impl CallKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Update => "update",
        }
    }
}

/// Talks to the repository canister through its HTTP JSON gateway.
pub struct CanisterClient {
    config: CanisterClientConfig,
    client: reqwest::Client,
    normalizer: Normalizer,
}

impl CanisterClient {
    pub fn new(config: CanisterClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            normalizer: Normalizer::default(),
        }
    }

    /// Replace the normalizer, e.g. to plug in a principal formatter.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn endpoint(&self, kind: CallKind, method: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            kind.as_str(),
            method
        )
    }

    fn build_request(&self, session: &Session, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(url).header("User-Agent", "repohub");

        if let Some(token) = session.bearer_token() {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        if let Some(timeout) = self.config.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    async fn call<T: DeserializeOwned>(
        &self,
        session: &Session,
        kind: CallKind,
        method: &str,
        args: serde_json::Value,
    ) -> Result<T, BackendError> {
        if kind == CallKind::Update && !session.is_authenticated() {
            return Err(BackendError::Unauthenticated);
        }

        let url = self.endpoint(kind, method);

        let reply: WireResult<T> = with_retry(&self.config.retry, |attempt| {
            let request = self.build_request(session, &url).json(&args);
            async move {
                tracing::debug!(%method, attempt, "calling backend");
                let response = request.send().await.map_err(|e| {
                    AttemptError::Retryable(BackendError::Transport(format!("{method}: {e}")))
                })?;

                let status = response.status();
                if !status.is_success() {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "unknown".into());
                    let err = BackendError::Transport(format!("{method}: HTTP {status}: {body}"));
                    return Err(if status.is_server_error() {
                        AttemptError::Retryable(err)
                    } else {
                        AttemptError::Fatal(err)
                    });
                }

                response.json::<WireResult<T>>().await.map_err(|e| {
                    AttemptError::Fatal(BackendError::Transport(format!(
                        "{method}: unreadable reply: {e}"
                    )))
                })
            }
        })
        .await?;

        Ok(reply.into_result()?)
    }

    /// Log and drop records that failed normalization.
    fn report<T>(&self, method: &str, normalized: Normalized<T>) -> T {
        for failure in &normalized.failures {
            tracing::warn!(%method, backend = %self.config.label, "dropped record: {failure}");
        }
        normalized.value
    }
}

#[async_trait::async_trait]
impl Backend for CanisterClient {
    fn label(&self) -> &str {
        &self.config.label
    }

    async fn list_repositories(
        &self,
        session: &Session,
        page: Pagination,
    ) -> Result<RepositoryPage, BackendError> {
        let wire: WireRepositoryPage = self
            .call(
                session,
                CallKind::Query,
                "listRepositories",
                json!({ "page": page.page, "limit": page.limit }),
            )
            .await?;

        Ok(self.report("listRepositories", self.normalizer.repository_page(wire)))
    }

    async fn get_repository(
        &self,
        session: &Session,
        id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError> {
        let wire: WireRepository = self
            .call(
                session,
                CallKind::Query,
                "getRepository",
                json!({ "id": id.as_str() }),
            )
            .await?;

        Ok(self.normalizer.repository_detail(&wire)?)
    }

    async fn list_files(
        &self,
        session: &Session,
        repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError> {
        let entries: Vec<serde_json::Value> = self
            .call(
                session,
                CallKind::Query,
                "listFiles",
                json!({ "repositoryId": repository.as_str() }),
            )
            .await?;

        Ok(self.report("listFiles", self.normalizer.file_entries(entries)))
    }

    async fn get_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<FileContent, BackendError> {
        let wire: WireFile = self
            .call(
                session,
                CallKind::Query,
                "getFile",
                json!({ "repositoryId": repository.as_str(), "path": path }),
            )
            .await?;

        Ok(self.normalizer.file(&wire)?)
    }

    async fn upload_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        upload: &FileUpload,
    ) -> Result<FileRecord, BackendError> {
        let content = base64::engine::general_purpose::STANDARD.encode(&upload.content);

        let wire: WireFileEntry = self
            .call(
                session,
                CallKind::Update,
                "uploadFile",
                json!({
                    "repositoryId": repository.as_str(),
                    "path": upload.path,
                    "content": content,
                }),
            )
            .await?;

        Ok(self.normalizer.file_entry(&wire)?)
    }

    async fn delete_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<(), BackendError> {
        let _: IgnoredAny = self
            .call(
                session,
                CallKind::Update,
                "deleteFile",
                json!({ "repositoryId": repository.as_str(), "path": path }),
            )
            .await?;

        Ok(())
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<SearchResults, BackendError> {
        let scope = match query.scope {
            SearchScope::All => "all",
            SearchScope::Repositories => "repositories",
            SearchScope::Files => "files",
        };
        let limit: Vec<u32> = query.limit.into_iter().collect();

        let wire: WireSearchResults = self
            .call(
                session,
                CallKind::Query,
                "search",
                json!({ "query": query.query, "scope": scope, "limit": limit }),
            )
            .await?;

        Ok(self.report("search", self.normalizer.search_results(wire)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = CanisterClient::new(CanisterClientConfig::new("http://localhost:4943/"));
        assert_eq!(
            client.endpoint(CallKind::Query, "listFiles"),
            "http://localhost:4943/query/listFiles"
        );
        assert_eq!(
            client.endpoint(CallKind::Update, "deleteFile"),
            "http://localhost:4943/update/deleteFile"
        );
    }

    #[test]
    fn default_config() {
        let config = CanisterClientConfig::new("http://x");
        assert_eq!(config.label, "canister");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }
}
