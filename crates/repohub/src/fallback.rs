use std::sync::Arc;

use crate::backend::{Backend, BackendError};
use crate::feedback::{Feedback, FeedbackLog};
use crate::mock::MockDataset;
use crate::model::{
    FileContent, FileRecord, FileUpload, Pagination, RepositoryDetail, RepositoryId,
    RepositoryPage, SearchQuery, SearchResults,
};
use crate::session::Session;

/// A backend that serves the static mock dataset whenever a read against
/// the inner backend fails.
///
/// Reads never return an error. Mutations are passed through untouched:
/// there is nothing meaningful to substitute for a failed write.
pub struct FallbackBackend {
    inner: Arc<dyn Backend>,
    mock: MockDataset,
    feedback: FeedbackLog,
}

impl FallbackBackend {
    pub fn new(inner: Arc<dyn Backend>) -> Self {
        Self {
            inner,
            mock: MockDataset,
            feedback: FeedbackLog::new(),
        }
    }

    /// Messages recorded for each substitution since the last drain.
    pub fn drain_feedback(&self) -> Vec<Feedback> {
        self.feedback.drain()
    }

    fn substitute<T>(
        &self,
        operation: &str,
        result: Result<T, BackendError>,
        mock: impl FnOnce() -> T,
    ) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.feedback.record(Feedback::warning(format!(
                    "{operation} failed on [{}]: {e}; showing mock data",
                    self.inner.label()
                )));
                mock()
            }
        }
    }

    /// Record which mock repository stands in for an id the dataset lacks.
    fn note_stand_in(&self, id: &RepositoryId) {
        if !self.mock.contains(id) {
            let shown = self.mock.repository(id).id;
            self.feedback.record(Feedback::info(format!(
                "repository {id} is not in the mock dataset; showing {shown}"
            )));
        }
    }
}

#[async_trait::async_trait]
impl Backend for FallbackBackend {
    fn label(&self) -> &str {
        self.inner.label()
    }

    async fn list_repositories(
        &self,
        session: &Session,
        page: Pagination,
    ) -> Result<RepositoryPage, BackendError> {
        let result = self.inner.list_repositories(session, page).await;
        Ok(self.substitute("list repositories", result, || self.mock.page(page)))
    }

    async fn get_repository(
        &self,
        session: &Session,
        id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError> {
        let result = self.inner.get_repository(session, id).await;
        Ok(self.substitute("get repository", result, || {
            self.note_stand_in(id);
            self.mock.repository(id)
        }))
    }

    async fn list_files(
        &self,
        session: &Session,
        repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError> {
        let result = self.inner.list_files(session, repository).await;
        Ok(self.substitute("list files", result, || {
            self.note_stand_in(repository);
            self.mock.files(repository)
        }))
    }

    async fn get_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<FileContent, BackendError> {
        let result = self.inner.get_file(session, repository, path).await;
        Ok(self.substitute("get file", result, || {
            self.note_stand_in(repository);
            self.mock.file(repository, path)
        }))
    }

    async fn upload_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        upload: &FileUpload,
    ) -> Result<FileRecord, BackendError> {
        self.inner.upload_file(session, repository, upload).await
    }

    async fn delete_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<(), BackendError> {
        self.inner.delete_file(session, repository, path).await
    }

    async fn search(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<SearchResults, BackendError> {
        match self.inner.search(session, query).await {
            Ok(results) => Ok(results),
            Err(e) => {
                self.feedback.record(Feedback::warning(format!(
                    "search failed on [{}]: {e}; searching mock data",
                    self.inner.label()
                )));
                crate::mock::MockBackend::new().search(session, query).await
            }
        }
    }
}
