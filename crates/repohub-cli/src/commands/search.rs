use anyhow::{Result, anyhow};
use repohub::{Backend, SearchQuery, SearchScope, Session};

use super::format;

pub async fn run(
    backend: &dyn Backend,
    session: &Session,
    query: &str,
    scope: &str,
    limit: Option<u32>,
) -> Result<()> {
    let scope = SearchScope::parse(scope)
        .ok_or_else(|| anyhow!("unknown scope {scope:?} (expected all, repositories or files)"))?;

    let mut search = SearchQuery::new(query).with_scope(scope);
    if let Some(limit) = limit {
        search = search.with_limit(limit);
    }

    let results = backend.search(session, &search).await?;

    if results.repositories.is_empty() && results.files.is_empty() {
        println!("No results found for \"{query}\".");
        return Ok(());
    }

    if !results.repositories.is_empty() {
        println!("Repositories ({})", results.repositories.len());
        format::print_repository_table(&results.repositories);
    }

    if !results.files.is_empty() {
        if !results.repositories.is_empty() {
            println!();
        }
        println!("Files ({})", results.files.len());
        for hit in &results.files {
            println!("  {}:{}", hit.repository_id, hit.path);
        }
    }

    println!("\n{} results", results.total_count);

    Ok(())
}
