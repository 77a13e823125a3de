use anyhow::{Result, bail};
use repohub::tree::{children_at, find};
use repohub::{Backend, RepositoryId, Session, TreeBuilder, breadcrumbs, fetch_tree};

use super::format;

pub struct TreeOptions<'a> {
    pub path: Option<&'a str>,
    pub json: bool,
}

pub async fn run(
    backend: &dyn Backend,
    session: &Session,
    repo: &str,
    builder: &TreeBuilder,
    options: TreeOptions<'_>,
) -> Result<()> {
    let tree = fetch_tree(backend, session, &RepositoryId::new(repo), builder).await?;

    let path = options.path.map(|p| p.trim_matches('/')).unwrap_or("");
    let Some(nodes) = children_at(&tree, path) else {
        if find(&tree, path).is_some() {
            bail!("{path} is a file; use `repohub cat {repo} {path}`");
        }
        bail!("No such folder in {repo}: {path}");
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(nodes)?);
        return Ok(());
    }

    let trail: Vec<String> = breadcrumbs(path).into_iter().map(|c| c.name).collect();
    if trail.is_empty() {
        println!("{repo}");
    } else {
        println!("{repo} / {}", trail.join(" / "));
    }

    for line in format::render_tree(nodes) {
        println!("{line}");
    }

    Ok(())
}
