use std::fmt;
use std::sync::Arc;

use crate::model::{
    FileContent, FileMatch, FileRecord, FileUpload, Pagination, RepositoryDetail, RepositoryId,
    RepositoryPage, SearchQuery, SearchResults,
};
use crate::normalize::StructuralError;
use crate::session::Session;
use crate::tree::{TreeBuilder, TreeNode};

/// Upper bound on listing pages walked by the default search.
const MAX_SEARCH_PAGES: u32 = 500;

/// Error kinds the backend reports in its tagged `err` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    BadRequest,
    Conflict,
    Forbidden,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::BadRequest => write!(f, "bad request"),
            Self::Conflict => write!(f, "conflict"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::InternalError => write!(f, "internal error"),
        }
    }
}

/// Errors that can occur when talking to a repository backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a tagged error.
    #[error("{kind}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Api {
        kind: ErrorKind,
        detail: Option<String>,
    },

    /// The call did not complete: network failure, non-success status or
    /// an unreadable reply.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("operation requires an authenticated session")]
    Unauthenticated,
}

impl BackendError {
    pub fn api(kind: ErrorKind, detail: Option<String>) -> Self {
        Self::Api { kind, detail }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::api(ErrorKind::NotFound, Some(detail.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api {
                kind: ErrorKind::NotFound,
                ..
            }
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A repository backend.
///
/// Every operation receives the caller's [`Session`]; implementations never
/// hold identity state of their own.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable label identifying this backend.
    fn label(&self) -> &str;

    async fn list_repositories(
        &self,
        session: &Session,
        page: Pagination,
    ) -> Result<RepositoryPage, BackendError>;

    async fn get_repository(
        &self,
        session: &Session,
        id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError>;

    /// Flat listing of every path in a repository.
    async fn list_files(
        &self,
        session: &Session,
        repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError>;

    async fn get_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<FileContent, BackendError>;

    async fn upload_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        upload: &FileUpload,
    ) -> Result<FileRecord, BackendError>;

    async fn delete_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<(), BackendError>;

    /// Search repositories and file paths.
    /// Default implementation walks the listing pages (stopping at the
    /// reported total, or after a fixed number of pages) and filters
    /// repositories by name and description, and file paths by substring.
    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<SearchResults, BackendError> {
        let needle = query.query.to_lowercase();
        let mut results = SearchResults::default();

        let mut page = Pagination::default();
        let mut repositories = Vec::new();
        loop {
            let listing = self.list_repositories(session, page).await?;
            let exhausted = !listing.has_more || listing.repositories.is_empty();
            repositories.extend(listing.repositories);

            if exhausted || repositories.len() as u64 >= listing.total_count {
                break;
            }
            if page.page + 1 >= MAX_SEARCH_PAGES {
                tracing::warn!(
                    backend = %self.label(),
                    pages = MAX_SEARCH_PAGES,
                    "listing never reported its last page; searching what was collected"
                );
                break;
            }
            page.page += 1;
        }

        if query.scope.includes_repositories() {
            results.repositories = repositories
                .iter()
                .filter(|repo| {
                    repo.name.to_lowercase().contains(&needle)
                        || repo
                            .description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                })
                .cloned()
                .collect();
        }

        if query.scope.includes_files() {
            for repo in &repositories {
                let files = self.list_files(session, &repo.id).await?;
                results.files.extend(
                    files
                        .into_iter()
                        .filter(|f| !f.is_folder && f.path.to_lowercase().contains(&needle))
                        .map(|f| FileMatch {
                            repository_id: repo.id.clone(),
                            path: f.path,
                        }),
                );
            }
        }

        if let Some(limit) = query.limit {
            let limit = limit as usize;
            results.repositories.truncate(limit);
            results
                .files
                .truncate(limit.saturating_sub(results.repositories.len()));
        }

        results.total_count = (results.repositories.len() + results.files.len()) as u64;
        Ok(results)
    }
}

#[async_trait::async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn list_repositories(
        &self,
        session: &Session,
        page: Pagination,
    ) -> Result<RepositoryPage, BackendError> {
        (**self).list_repositories(session, page).await
    }

    async fn get_repository(
        &self,
        session: &Session,
        id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError> {
        (**self).get_repository(session, id).await
    }

    async fn list_files(
        &self,
        session: &Session,
        repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError> {
        (**self).list_files(session, repository).await
    }

    async fn get_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<FileContent, BackendError> {
        (**self).get_file(session, repository, path).await
    }

    async fn upload_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        upload: &FileUpload,
    ) -> Result<FileRecord, BackendError> {
        (**self).upload_file(session, repository, upload).await
    }

    async fn delete_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<(), BackendError> {
        (**self).delete_file(session, repository, path).await
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<SearchResults, BackendError> {
        (**self).search(session, query).await
    }
}

/// List a repository's files and assemble them into a tree.
pub async fn fetch_tree(
    backend: &dyn Backend,
    session: &Session,
    repository: &RepositoryId,
    builder: &TreeBuilder,
) -> Result<Vec<TreeNode>, BackendError> {
    let records = backend.list_files(session, repository).await?;
    Ok(builder.build(&records))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::test_support::sample_repository;

    use super::*;

    /// Listing that always claims another page follows.
    struct EndlessListing {
        total_count: u64,
        calls: AtomicU32,
    }

    impl EndlessListing {
        fn new(total_count: u64) -> Self {
            Self {
                total_count,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Backend for EndlessListing {
        fn label(&self) -> &str {
            "endless"
        }

        async fn list_repositories(
            &self,
            _session: &Session,
            page: Pagination,
        ) -> Result<RepositoryPage, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = format!("repo-{}", page.page);
            Ok(RepositoryPage {
                repositories: vec![sample_repository(&id, &id, None).summary()],
                total_count: self.total_count,
                has_more: true,
            })
        }

        async fn get_repository(
            &self,
            _session: &Session,
            id: &RepositoryId,
        ) -> Result<RepositoryDetail, BackendError> {
            Err(BackendError::not_found(id.to_string()))
        }

        async fn list_files(
            &self,
            _session: &Session,
            _repository: &RepositoryId,
        ) -> Result<Vec<FileRecord>, BackendError> {
            Ok(Vec::new())
        }

        async fn get_file(
            &self,
            _session: &Session,
            _repository: &RepositoryId,
            path: &str,
        ) -> Result<FileContent, BackendError> {
            Err(BackendError::not_found(path.to_owned()))
        }

        async fn upload_file(
            &self,
            _session: &Session,
            _repository: &RepositoryId,
            _upload: &FileUpload,
        ) -> Result<FileRecord, BackendError> {
            Err(BackendError::Unauthenticated)
        }

        async fn delete_file(
            &self,
            _session: &Session,
            _repository: &RepositoryId,
            _path: &str,
        ) -> Result<(), BackendError> {
            Err(BackendError::Unauthenticated)
        }
    }

    #[tokio::test]
    async fn search_stops_at_reported_total() {
        let backend = EndlessListing::new(3);
        let results = backend
            .search(&Session::anonymous(), &SearchQuery::new("repo"))
            .await
            .unwrap();

        assert_eq!(results.repositories.len(), 3);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn search_caps_pages_when_total_is_unreachable() {
        let backend = EndlessListing::new(u64::MAX);
        let results = backend
            .search(&Session::anonymous(), &SearchQuery::new("repo"))
            .await
            .unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), MAX_SEARCH_PAGES);
        assert_eq!(results.repositories.len(), MAX_SEARCH_PAGES as usize);
    }

    #[test]
    fn api_error_display_includes_detail() {
        let err = BackendError::api(ErrorKind::Conflict, Some("path exists".to_owned()));
        assert_eq!(err.to_string(), "conflict: path exists");

        let bare = BackendError::api(ErrorKind::Forbidden, None);
        assert_eq!(bare.to_string(), "forbidden: no detail");
    }

    #[test]
    fn classification_helpers() {
        assert!(BackendError::not_found("repo-9").is_not_found());
        assert!(!BackendError::Transport("reset".into()).is_not_found());
        assert!(BackendError::Transport("reset".into()).is_transport());
    }

    #[test]
    fn structural_error_converts() {
        let err: BackendError = StructuralError::MissingField {
            record: "file",
            field: "path",
        }
        .into();
        assert_eq!(err.to_string(), "file is missing mandatory field `path`");
    }
}
