use anyhow::Result;
use repohub::{Backend, RepositoryId, Session};

use super::format::{format_size, format_timestamp};

pub async fn run(backend: &dyn Backend, session: &Session, id: &str) -> Result<()> {
    let repo = backend
        .get_repository(session, &RepositoryId::new(id))
        .await?;

    println!("Name:          {}", repo.name);
    println!("ID:            {}", repo.id);
    if let Some(owner) = &repo.owner {
        println!("Owner:         {owner}");
    }

    if let Some(desc) = &repo.description {
        println!("Description:   {desc}");
    }
    println!(
        "Visibility:    {}",
        if repo.is_private { "private" } else { "public" }
    );
    println!("Branch:        {}", repo.default_branch);
    if let Some(language) = &repo.language {
        println!("Language:      {language}");
    }
    if let Some(license) = &repo.license {
        println!("License:       {license}");
    }
    println!("Stars / forks: {} / {}", repo.stars, repo.forks);
    println!("Size:          {}", format_size(repo.size));
    if !repo.topics.is_empty() {
        println!("Topics:        {}", repo.topics.join(", "));
    }
    if !repo.collaborators.is_empty() {
        println!("Collaborators: {}", repo.collaborators.join(", "));
    }
    println!("Created:       {}", format_timestamp(repo.created_at));
    println!("Updated:       {}", format_timestamp(repo.updated_at));

    Ok(())
}
