use anyhow::{Context, Result};
use repohub::{Backend, RepositoryId, Session};

pub async fn run(backend: &dyn Backend, session: &Session, repo: &str, path: &str) -> Result<()> {
    backend
        .delete_file(session, &RepositoryId::new(repo), path)
        .await
        .with_context(|| format!("failed to delete {repo}:{path}"))?;

    println!("Deleted {path}");

    Ok(())
}
