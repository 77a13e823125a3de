//! Fixed dataset served when the live backend is unavailable.

use crate::backend::{Backend, BackendError, ErrorKind};
use crate::model::{
    FileContent, FileRecord, FileUpload, Pagination, RepositoryDetail, RepositoryId,
    RepositoryPage,
};
use crate::normalize::nanos_to_millis;
use crate::session::Session;

/// 2023-11-14T22:13:20Z in nanoseconds.
const EPOCH_NANOS: u128 = 1_700_000_000_000_000_000;
const DAY_NANOS: u128 = 86_400_000_000_000;

struct MockFile {
    path: &'static str,
    content: &'static str,
}

const HELLO_FILES: &[MockFile] = &[
    MockFile {
        path: "dfx.json",
        content: "{\n  \"canisters\": {\n    \"hello_backend\": { \"main\": \"src/hello_backend/main.mo\", \"type\": \"motoko\" }\n  }\n}\n",
    },
    MockFile {
        path: "README.md",
        content: "# hello-canister\n\nA minimal greeting canister.\n",
    },
    MockFile {
        path: "src/hello_backend/main.mo",
        content: "actor {\n  public query func greet(name : Text) : async Text {\n    return \"Hello, \" # name # \"!\";\n  };\n};\n",
    },
    MockFile {
        path: "src/hello_frontend/assets/.keep",
        content: "",
    },
    MockFile {
        path: "src/hello_frontend/index.html",
        content: "<!doctype html>\n<title>hello</title>\n",
    },
];

const LEDGER_FILES: &[MockFile] = &[
    MockFile {
        path: "README.md",
        content: "# ledger-dao\n\nToken ledger with proposal voting.\n",
    },
    MockFile {
        path: "src/main.mo",
        content: "import Types \"types\";\n\nactor Ledger {\n  stable var supply : Nat = 1_000_000;\n};\n",
    },
    MockFile {
        path: "src/types.mo",
        content: "module {\n  public type Account = { owner : Principal; balance : Nat };\n};\n",
    },
    MockFile {
        path: "src/governance/proposals.mo",
        content: "module {\n  public type Proposal = { id : Nat; title : Text; votesFor : Nat; votesAgainst : Nat };\n};\n",
    },
    MockFile {
        path: "docs/.keep",
        content: "",
    },
];

const BOUNTY_FILES: &[MockFile] = &[
    MockFile {
        path: "README.md",
        content: "# bounty-board\n\nPost and claim bounties for open issues.\n",
    },
    MockFile {
        path: "Cargo.toml",
        content: "[package]\nname = \"bounty-board\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    },
    MockFile {
        path: "src/lib.rs",
        content: "pub fn reward(amount: u64) -> u64 {\n    amount\n}\n",
    },
];

struct MockRepository {
    id: &'static str,
    name: &'static str,
    description: Option<&'static str>,
    owner: &'static str,
    language: Option<&'static str>,
    license: Option<&'static str>,
    topics: &'static [&'static str],
    stars: u64,
    forks: u64,
    age_days: u64,
    files: &'static [MockFile],
}

const REPOSITORIES: &[MockRepository] = &[
    MockRepository {
        id: "mock-hello-canister",
        name: "hello-canister",
        description: Some("A minimal greeting canister"),
        owner: "2vxsx-fae",
        language: Some("Motoko"),
        license: Some("MIT"),
        topics: &["example", "motoko"],
        stars: 42,
        forks: 7,
        age_days: 30,
        files: HELLO_FILES,
    },
    MockRepository {
        id: "mock-ledger-dao",
        name: "ledger-dao",
        description: Some("Token ledger with proposal voting"),
        owner: "rrkah-fqaaa-aaaaa-aaaaq-cai",
        language: Some("Motoko"),
        license: Some("Apache-2.0"),
        topics: &["dao", "governance", "ledger"],
        stars: 128,
        forks: 19,
        age_days: 90,
        files: LEDGER_FILES,
    },
    MockRepository {
        id: "mock-bounty-board",
        name: "bounty-board",
        description: None,
        owner: "ryjl3-tyaaa-aaaaa-aaaba-cai",
        language: Some("Rust"),
        license: None,
        topics: &["bounties"],
        stars: 5,
        forks: 0,
        age_days: 3,
        files: BOUNTY_FILES,
    },
];

impl MockRepository {
    fn created_nanos(&self) -> u128 {
        EPOCH_NANOS - u128::from(self.age_days) * DAY_NANOS
    }

    fn detail(&self) -> RepositoryDetail {
        RepositoryDetail {
            id: RepositoryId::new(self.id),
            name: self.name.to_owned(),
            description: self.description.map(str::to_owned),
            owner: Some(self.owner.to_owned()),
            is_private: false,
            stars: self.stars,
            forks: self.forks,
            language: self.language.map(str::to_owned),
            license: self.license.map(str::to_owned),
            default_branch: "main".to_owned(),
            topics: self.topics.iter().map(|t| (*t).to_owned()).collect(),
            collaborators: vec![self.owner.to_owned()],
            size: self.files.iter().map(|f| f.content.len() as u64).sum(),
            created_at: nanos_to_millis(self.created_nanos()),
            updated_at: nanos_to_millis(EPOCH_NANOS),
        }
    }

    fn records(&self) -> Vec<FileRecord> {
        self.files
            .iter()
            .map(|f| FileRecord::file(f.path, f.content.len() as u64, EPOCH_NANOS))
            .collect()
    }
}

/// The static mock dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDataset;

impl MockDataset {
    fn lookup(&self, id: &RepositoryId) -> &'static MockRepository {
        REPOSITORIES
            .iter()
            .find(|r| r.id == id.as_str())
            .unwrap_or(&REPOSITORIES[0])
    }

    pub fn contains(&self, id: &RepositoryId) -> bool {
        REPOSITORIES.iter().any(|r| r.id == id.as_str())
    }

    pub fn page(&self, page: Pagination) -> RepositoryPage {
        let limit = page.limit.max(1) as usize;
        let start = (page.page as usize).saturating_mul(limit);

        let repositories: Vec<_> = REPOSITORIES
            .iter()
            .skip(start)
            .take(limit)
            .map(|r| r.detail().summary())
            .collect();

        RepositoryPage {
            has_more: start + repositories.len() < REPOSITORIES.len(),
            repositories,
            total_count: REPOSITORIES.len() as u64,
        }
    }

    /// The repository with `id`, or the first mock repository when the id
    /// is unknown.
    pub fn repository(&self, id: &RepositoryId) -> RepositoryDetail {
        self.lookup(id).detail()
    }

    pub fn files(&self, id: &RepositoryId) -> Vec<FileRecord> {
        self.lookup(id).records()
    }

    /// The file at `path`; an unknown path yields an empty file.
    pub fn file(&self, id: &RepositoryId, path: &str) -> FileContent {
        let content = self
            .lookup(id)
            .files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_bytes().to_vec())
            .unwrap_or_default();

        FileContent {
            path: path.to_owned(),
            size: content.len() as u64,
            content,
            last_modified: nanos_to_millis(EPOCH_NANOS),
        }
    }
}

/// Read-only backend serving [`MockDataset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBackend {
    dataset: MockDataset,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read_only() -> BackendError {
    BackendError::api(
        ErrorKind::Forbidden,
        Some("mock dataset is read-only".to_owned()),
    )
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    fn label(&self) -> &str {
        "mock"
    }

    async fn list_repositories(
        &self,
        _session: &Session,
        page: Pagination,
    ) -> Result<RepositoryPage, BackendError> {
        Ok(self.dataset.page(page))
    }

    async fn get_repository(
        &self,
        _session: &Session,
        id: &RepositoryId,
    ) -> Result<RepositoryDetail, BackendError> {
        Ok(self.dataset.repository(id))
    }

    async fn list_files(
        &self,
        _session: &Session,
        repository: &RepositoryId,
    ) -> Result<Vec<FileRecord>, BackendError> {
        Ok(self.dataset.files(repository))
    }

    async fn get_file(
        &self,
        _session: &Session,
        repository: &RepositoryId,
        path: &str,
    ) -> Result<FileContent, BackendError> {
        Ok(self.dataset.file(repository, path))
    }

    async fn upload_file(
        &self,
        _session: &Session,
        _repository: &RepositoryId,
        _upload: &FileUpload,
    ) -> Result<FileRecord, BackendError> {
        Err(read_only())
    }

    async fn delete_file(
        &self,
        _session: &Session,
        _repository: &RepositoryId,
        _path: &str,
    ) -> Result<(), BackendError> {
        Err(read_only())
    }
}
