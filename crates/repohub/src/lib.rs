pub mod backend;
pub mod fallback;
pub mod feedback;
pub mod mock;
pub mod model;
pub mod normalize;
pub mod path;
pub mod session;
pub mod tree;
pub mod wire;

pub use backend::{Backend, BackendError, ErrorKind, fetch_tree};
pub use fallback::FallbackBackend;
pub use feedback::{Feedback, FeedbackLog};
pub use mock::{MockBackend, MockDataset};
pub use model::{
    FileContent, FileMatch, FileRecord, FileUpload, Pagination, RepositoryDetail, RepositoryId,
    RepositoryPage, RepositorySummary, SearchQuery, SearchResults, SearchScope,
};
pub use normalize::{CanonicalText, Normalized, Normalizer, PrincipalFormatter, StructuralError};
pub use path::{Breadcrumb, breadcrumbs};
pub use session::{Anonymous, Identity, IdentityProvider, Session, StaticIdentity, ensure_session};
pub use tree::{SiblingOrder, TreeBuilder, TreeNode, build_tree};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
