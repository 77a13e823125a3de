//! Converts wire records into display models.

use std::sync::Arc;

use base64::Engine;
use serde::de::DeserializeOwned;

use crate::model::{
    FileContent, FileMatch, FileRecord, RepositoryDetail, RepositoryId, RepositoryPage,
    RepositorySummary, SearchResults,
};
use crate::wire::{
    WireFile, WireFileEntry, WireFileMatch, WirePrincipal, WireRepository, WireRepositoryPage,
    WireSearchResults,
};

const NANOS_PER_MILLI: u128 = 1_000_000;
const DEFAULT_BRANCH: &str = "main";

/// Nanoseconds to milliseconds, saturating at `u64::MAX`.
pub fn nanos_to_millis(nanos: u128) -> u64 {
    u64::try_from(nanos / NANOS_PER_MILLI).unwrap_or(u64::MAX)
}

/// A wire record could not be turned into a display model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("{record} is missing mandatory field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record} field `{field}` is an option with {len} elements")]
    MalformedOption {
        record: &'static str,
        field: &'static str,
        len: usize,
    },

    #[error("{record} field `{field}` is invalid: {reason}")]
    InvalidField {
        record: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("{record} could not be decoded: {reason}")]
    Undecodable {
        record: &'static str,
        reason: String,
    },
}

/// A normalized value plus the records that had to be dropped from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    pub value: T,
    pub failures: Vec<StructuralError>,
}

impl<T> Normalized<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns a principal into its display text.
///
/// The canonical textual encoding belongs to the identity layer; callers
/// that hold a richer principal type plug their own formatter in.
pub trait PrincipalFormatter: Send + Sync {
    fn format(&self, principal: &WirePrincipal) -> String;
}

impl<F> PrincipalFormatter for F
where
    F: Fn(&WirePrincipal) -> String + Send + Sync,
{
    fn format(&self, principal: &WirePrincipal) -> String {
        self(principal)
    }
}

/// Uses the textual form already present on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalText;

impl PrincipalFormatter for CanonicalText {
    fn format(&self, principal: &WirePrincipal) -> String {
        principal.as_text().to_owned()
    }
}

/// Unwrap a zero-or-one element option field.
pub fn unwrap_opt<T: Clone>(
    record: &'static str,
    field: &'static str,
    values: &[T],
) -> Result<Option<T>, StructuralError> {
    match values {
        [] => Ok(None),
        [single] => Ok(Some(single.clone())),
        _ => Err(StructuralError::MalformedOption {
            record,
            field,
            len: values.len(),
        }),
    }
}

fn required<'a, T>(
    record: &'static str,
    field: &'static str,
    value: &'a Option<T>,
) -> Result<&'a T, StructuralError> {
    value
        .as_ref()
        .ok_or(StructuralError::MissingField { record, field })
}

/// Decode one untyped entry of a listing.
pub fn decode<T: DeserializeOwned>(
    record: &'static str,
    value: serde_json::Value,
) -> Result<T, StructuralError> {
    serde_json::from_value(value).map_err(|e| StructuralError::Undecodable {
        record,
        reason: e.to_string(),
    })
}

/// Maps wire records to display models.
#[derive(Clone)]
pub struct Normalizer {
    principals: Arc<dyn PrincipalFormatter>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Arc::new(CanonicalText))
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

impl Normalizer {
    pub fn new(principals: Arc<dyn PrincipalFormatter>) -> Self {
        Self { principals }
    }

    pub fn repository_summary(
        &self,
        wire: &WireRepository,
    ) -> Result<RepositorySummary, StructuralError> {
        const RECORD: &str = "repository";

        Ok(RepositorySummary {
            id: RepositoryId::new(required(RECORD, "id", &wire.id)?),
            name: required(RECORD, "name", &wire.name)?.clone(),
            description: unwrap_opt(RECORD, "description", &wire.description)?,
            owner: wire.owner.as_ref().map(|p| self.principals.format(p)),
            is_private: wire.is_private,
            stars: wire.stars.to_u64(),
            forks: wire.forks.to_u64(),
            language: unwrap_opt(RECORD, "language", &wire.language)?,
            updated_at: wire.updated_at.nanos_to_millis(),
        })
    }

    pub fn repository_detail(
        &self,
        wire: &WireRepository,
    ) -> Result<RepositoryDetail, StructuralError> {
        const RECORD: &str = "repository";

        let summary = self.repository_summary(wire)?;

        Ok(RepositoryDetail {
            id: summary.id,
            name: summary.name,
            description: summary.description,
            owner: summary.owner,
            is_private: summary.is_private,
            stars: summary.stars,
            forks: summary.forks,
            language: summary.language,
            license: unwrap_opt(RECORD, "license", &wire.license)?,
            default_branch: unwrap_opt(RECORD, "defaultBranch", &wire.default_branch)?
                .unwrap_or_else(|| DEFAULT_BRANCH.to_owned()),
            topics: wire.topics.clone(),
            collaborators: wire
                .collaborators
                .iter()
                .map(|p| self.principals.format(p))
                .collect(),
            size: wire.size.to_u64(),
            created_at: wire.created_at.nanos_to_millis(),
            updated_at: summary.updated_at,
        })
    }

    /// Normalize every repository in a listing, dropping the ones that fail.
    pub fn repositories(
        &self,
        entries: Vec<serde_json::Value>,
    ) -> Normalized<Vec<RepositorySummary>> {
        normalize_each(entries, |value| {
            let wire: WireRepository = decode("repository", value)?;
            self.repository_summary(&wire)
        })
    }

    pub fn repository_page(&self, wire: WireRepositoryPage) -> Normalized<RepositoryPage> {
        let Normalized { value, failures } = self.repositories(wire.repositories);

        Normalized {
            value: RepositoryPage {
                repositories: value,
                total_count: wire.total_count.to_u64(),
                has_more: wire.has_more,
            },
            failures,
        }
    }

    pub fn file_entry(&self, wire: &WireFileEntry) -> Result<FileRecord, StructuralError> {
        Ok(FileRecord {
            path: required("file entry", "path", &wire.path)?.clone(),
            is_folder: wire.is_folder,
            size: wire.size.to_u64(),
            last_modified_raw: wire.last_modified.0,
        })
    }

    pub fn file_entries(&self, entries: Vec<serde_json::Value>) -> Normalized<Vec<FileRecord>> {
        normalize_each(entries, |value| {
            let wire: WireFileEntry = decode("file entry", value)?;
            self.file_entry(&wire)
        })
    }

    pub fn file(&self, wire: &WireFile) -> Result<FileContent, StructuralError> {
        const RECORD: &str = "file";

        let path = required(RECORD, "path", &wire.path)?.clone();
        let content = base64::engine::general_purpose::STANDARD
            .decode(wire.content.trim())
            .map_err(|e| StructuralError::InvalidField {
                record: RECORD,
                field: "content",
                reason: e.to_string(),
            })?;

        Ok(FileContent {
            path,
            content,
            size: wire.size.to_u64(),
            last_modified: wire.last_modified.nanos_to_millis(),
        })
    }

    fn file_match(&self, wire: &WireFileMatch) -> Result<FileMatch, StructuralError> {
        const RECORD: &str = "file match";

        Ok(FileMatch {
            repository_id: RepositoryId::new(required(RECORD, "repositoryId", &wire.repository_id)?),
            path: required(RECORD, "path", &wire.path)?.clone(),
        })
    }

    pub fn search_results(&self, wire: WireSearchResults) -> Normalized<SearchResults> {
        let repositories = self.repositories(wire.repositories);
        let files = normalize_each(wire.files, |value| {
            let wire: WireFileMatch = decode("file match", value)?;
            self.file_match(&wire)
        });

        let mut failures = repositories.failures;
        failures.extend(files.failures);

        Normalized {
            value: SearchResults {
                repositories: repositories.value,
                files: files.value,
                total_count: wire.total_count.to_u64(),
            },
            failures,
        }
    }
}

fn normalize_each<T, F>(entries: Vec<serde_json::Value>, mut f: F) -> Normalized<Vec<T>>
where
    F: FnMut(serde_json::Value) -> Result<T, StructuralError>,
{
    let mut value = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();

    for entry in entries {
        match f(entry) {
            Ok(item) => value.push(item),
            Err(e) => failures.push(e),
        }
    }

    Normalized { value, failures }
}
