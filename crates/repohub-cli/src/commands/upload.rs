use std::path::Path;

use anyhow::{Context, Result};
use repohub::{Backend, FileUpload, RepositoryId, Session};

use super::format::format_size;

pub async fn run(
    backend: &dyn Backend,
    session: &Session,
    repo: &str,
    local: &Path,
    dest: &str,
) -> Result<()> {
    let content = std::fs::read(local)
        .with_context(|| format!("failed to read {}", local.display()))?;

    let upload = FileUpload {
        path: dest.trim_matches('/').to_owned(),
        content,
    };

    let record = backend
        .upload_file(session, &RepositoryId::new(repo), &upload)
        .await
        .with_context(|| format!("upload to {repo}:{} failed", upload.path))?;

    println!("Uploaded {} ({})", record.path, format_size(record.size));

    Ok(())
}
