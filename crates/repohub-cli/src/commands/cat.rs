use std::io::Write;

use anyhow::{Context, Result};
use repohub::{Backend, RepositoryId, Session};

pub async fn run(backend: &dyn Backend, session: &Session, repo: &str, path: &str) -> Result<()> {
    let file = backend
        .get_file(session, &RepositoryId::new(repo), path)
        .await?;

    std::io::stdout()
        .write_all(&file.content)
        .context("failed to write file to stdout")?;

    Ok(())
}
