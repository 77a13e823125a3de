use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    Backend, BackendError, ErrorKind, FileContent, FileRecord, FileUpload, Pagination,
    RepositoryDetail, RepositoryId, RepositoryPage, Session,
};

/// In-memory backend for testing. Files are stored per repository in
/// insertion order; writes require an authenticated session.
pub struct InMemoryBackend {
    label: String,
    repositories: Vec<RepositoryDetail>,
    files: Mutex<HashMap<RepositoryId, Vec<(FileRecord, Vec<u8>)>>>,
}

impl InMemoryBackend {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            repositories: Vec::new(),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_repository(&mut self, repository: RepositoryDetail) {
        self.repositories.push(repository);
    }

    pub fn add_file(&mut self, repository: &str, path: &str, content: &str) {
        let record = FileRecord::file(path, content.len() as u64, 0);
        self.files
            .get_mut()
            .unwrap()
            .entry(RepositoryId::new(repository))
            .or_default()
            .push((record, content.as_bytes().to_vec()));
    }
}

/// Build a repository detail with sensible defaults.
pub fn sample_repository(id: &str, name: &str, description: Option<&str>) -> RepositoryDetail {
    RepositoryDetail {
        id: RepositoryId::new(id),
        name: name.to_owned(),
        description: description.map(str::to_owned),
        owner: Some("2vxsx-fae".to_owned()),
        is_private: false,
        stars: 0,
        forks: 0,
        language: None,
        license: None,
        default_branch: "main".to_owned(),
        topics: vec![],
        collaborators: vec![],
        size: 0,
        created_at: 0,
        updated_at: 0,
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list_repositories(
        &self,
        _session: &Session,
        page: Pagination,
    ) -> Result<RepositoryPage, BackendError> {
        let limit = page.limit.max(1) as usize;
        let start = page.page as usize * limit;
        let repositories: Vec<_> = self
            .repositories
            .iter()
            .skip(start)
            .take(limit)
            .map(|r| r.summary())
            .collect();

        Ok(RepositoryPage {
            has_more: start + repositories.len() < self.repositories.len(),
            repositories,
            total_count: self.repositories.len() as u64,
        })
    }

    async fn get_repository(
        &self,
        _session: &Session,
        id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError> {
        self.repositories
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(id.to_string()))
    }

    async fn list_files(
        &self,
        _session: &Session,
        repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError> {
        let files = self.files.lock().unwrap();
        Ok(files
            .get(repository)
            .map(|entries| entries.iter().map(|(r, _)| r.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_file(
        &self,
        _session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<FileContent, BackendError> {
        let files = self.files.lock().unwrap();
        files
            .get(repository)
            .and_then(|entries| entries.iter().find(|(r, _)| r.path == path))
            .map(|(record, content)| FileContent {
                path: record.path.clone(),
                content: content.clone(),
                size: record.size,
                last_modified: 0,
            })
            .ok_or_else(|| BackendError::not_found(path.to_owned()))
    }

    async fn upload_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        upload: &FileUpload,
    ) -> Result<FileRecord, BackendError> {
        if !session.is_authenticated() {
            return Err(BackendError::Unauthenticated);
        }

        let mut files = self.files.lock().unwrap();
        let entries = files.entry(repository.clone()).or_default();
        if entries.iter().any(|(r, _)| r.path == upload.path) {
            return Err(BackendError::api(
                ErrorKind::Conflict,
                Some(format!("{} already exists", upload.path)),
            ));
        }

        let record = FileRecord::file(&upload.path, upload.content.len() as u64, 0);
        entries.push((record.clone(), upload.content.clone()));
        Ok(record)
    }

    async fn delete_file(
        &self,
        session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<(), BackendError> {
        if !session.is_authenticated() {
            return Err(BackendError::Unauthenticated);
        }

        let mut files = self.files.lock().unwrap();
        let entries = files
            .get_mut(repository)
            .ok_or_else(|| BackendError::not_found(repository.to_string()))?;
        let before = entries.len();
        entries.retain(|(r, _)| r.path != path);

        if entries.len() == before {
            return Err(BackendError::not_found(path.to_owned()));
        }
        Ok(())
    }
}

/// Backend whose every call fails with the same error.
pub struct FailingBackend {
    make_error: Box<dyn Fn() -> BackendError + Send + Sync>,
}

impl FailingBackend {
    pub fn transport(message: &str) -> Self {
        let message = message.to_owned();
        Self {
            make_error: Box::new(move || BackendError::Transport(message.clone())),
        }
    }

    pub fn api(kind: ErrorKind) -> Self {
        Self {
            make_error: Box::new(move || BackendError::api(kind, None)),
        }
    }

    fn fail<T>(&self) -> Result<T, BackendError> {
        Err((self.make_error)())
    }
}

#[async_trait::async_trait]
impl Backend for FailingBackend {
    fn label(&self) -> &str {
        "failing"
    }

    async fn list_repositories(
        &self,
        _session: &Session,
        _page: Pagination,
    ) -> Result<RepositoryPage, BackendError> {
        self.fail()
    }

    async fn get_repository(
        &self,
        _session: &Session,
        _id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError> {
        self.fail()
    }

    async fn list_files(
        &self,
        _session: &Session,
        _repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError> {
        self.fail()
    }

    async fn get_file(
        &self,
        _session: &Session,
        _repository: &RepositoryId,
        _path: &str,
    ) -> Result<FileContent, BackendError> {
        self.fail()
    }

    async fn upload_file(
        &self,
        _session: &Session,
        _repository: &RepositoryId,
        _upload: &FileUpload,
    ) -> Result<FileRecord, BackendError> {
        self.fail()
    }

    async fn delete_file(
        &self,
        _session: &Session,
        _repository: &RepositoryId,
        _path: &str,
    ) -> Result<(), BackendError> {
        self.fail()
    }
}
