use anyhow::Result;
use repohub::{Backend, Pagination, Session};

use super::format;

pub async fn run(backend: &dyn Backend, session: &Session, page: Pagination) -> Result<()> {
    let listing = backend.list_repositories(session, page).await?;

    if listing.repositories.is_empty() {
        println!("No repositories.");
        return Ok(());
    }

    format::print_repository_table(&listing.repositories);

    let more = if listing.has_more {
        format!(" (more: --page {})", page.page + 1)
    } else {
        String::new()
    };
    println!(
        "\n{} of {} repositories{more}",
        listing.repositories.len(),
        listing.total_count
    );

    Ok(())
}
