mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use repohub::{
    Anonymous, Backend, FallbackBackend, IdentityProvider, MockBackend, Pagination, Session,
    StaticIdentity, ensure_session,
};
use repohub_http::CanisterClient;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::tree::TreeOptions;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "repohub")]
#[command(about = "Browse and manage repositories hosted on a repository canister")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Serve the built-in mock dataset without contacting the backend
    #[arg(long, global = true)]
    offline: bool,

    /// Report backend failures instead of falling back to mock data
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List repositories
    Repos {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Repositories per page
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show repository details
    Show {
        /// Repository ID
        id: String,
    },
    /// Print the file tree of a repository
    Tree {
        /// Repository ID
        repo: String,
        /// Only show the contents of this folder
        #[arg(long)]
        path: Option<String>,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
        /// List folders before files, each sorted by name
        #[arg(long)]
        folders_first: bool,
    },
    /// Print a file's contents
    Cat {
        /// Repository ID
        repo: String,
        /// File path within the repository
        path: String,
    },
    /// Search repositories and file paths
    Search {
        /// Search query
        query: String,
        /// What to search: all, repositories or files
        #[arg(long, default_value = "all")]
        scope: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Upload a local file into a repository
    Upload {
        /// Repository ID
        repo: String,
        /// Local file to upload
        local: PathBuf,
        /// Destination path within the repository
        #[arg(long)]
        dest: String,
    },
    /// Delete a file from a repository
    Rm {
        /// Repository ID
        repo: String,
        /// File path within the repository
        path: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn identity_provider() -> Box<dyn IdentityProvider> {
    match config::identity_from_env(|key| std::env::var(key).ok()) {
        Some(identity) => Box::new(StaticIdentity(identity)),
        None => Box::new(Anonymous),
    }
}

/// The backend every command talks to, plus the fallback wrapper (if any)
/// whose feedback is shown after the command runs.
struct Wiring {
    backend: Arc<dyn Backend>,
    fallback: Option<Arc<FallbackBackend>>,
}

impl Wiring {
    fn build(cli: &Cli, config: &AppConfig) -> Self {
        if cli.offline {
            tracing::debug!("offline: serving mock dataset");
            return Self {
                backend: Arc::new(MockBackend::new()),
                fallback: None,
            };
        }

        let client: Arc<dyn Backend> = Arc::new(CanisterClient::new(config.client_config()));

        if cli.no_fallback || !config.fallback.enabled {
            return Self {
                backend: client,
                fallback: None,
            };
        }

        let fallback = Arc::new(FallbackBackend::new(client));
        Self {
            backend: Arc::clone(&fallback) as Arc<dyn Backend>,
            fallback: Some(fallback),
        }
    }

    fn flush_feedback(&self) {
        if let Some(fallback) = &self.fallback {
            commands::print_feedback(&fallback.drain_feedback());
        }
    }
}

async fn dispatch(
    command: Command,
    backend: &dyn Backend,
    session: &Session,
    config: &AppConfig,
) -> Result<()> {
    match command {
        Command::Repos { page, limit } => {
            commands::repos::run(backend, session, Pagination { page, limit }).await
        }
        Command::Show { id } => commands::show::run(backend, session, &id).await,
        Command::Tree {
            repo,
            path,
            json,
            folders_first,
        } => {
            let builder = config.tree_builder(folders_first);
            let options = TreeOptions {
                path: path.as_deref(),
                json,
            };
            commands::tree::run(backend, session, &repo, &builder, options).await
        }
        Command::Cat { repo, path } => commands::cat::run(backend, session, &repo, &path).await,
        Command::Search {
            query,
            scope,
            limit,
        } => commands::search::run(backend, session, &query, &scope, limit).await,
        Command::Upload { repo, local, dest } => {
            commands::upload::run(backend, session, &repo, &local, &dest).await
        }
        Command::Rm { repo, path } => commands::rm::run(backend, session, &repo, &path).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = config::load_config();
    config.apply_env(|key| std::env::var(key).ok());

    let session = ensure_session(identity_provider().as_ref());
    let wiring = Wiring::build(&cli, &config);

    let result = dispatch(cli.command, wiring.backend.as_ref(), &session, &config).await;
    wiring.flush_feedback();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("repohub").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = parse(&["tree", "repo-1", "--path", "src", "--offline", "--folders-first"]);
        assert!(cli.offline);
        match cli.command {
            Command::Tree {
                repo,
                path,
                json,
                folders_first,
            } => {
                assert_eq!(repo, "repo-1");
                assert_eq!(path.as_deref(), Some("src"));
                assert!(!json);
                assert!(folders_first);
            }
            _ => panic!("expected tree"),
        }
    }

    #[test]
    fn upload_requires_destination() {
        let result = Cli::try_parse_from(["repohub", "upload", "repo-1", "notes.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn offline_uses_mock_backend() {
        let cli = parse(&["repos", "--offline"]);
        let wiring = Wiring::build(&cli, &AppConfig::default());
        assert_eq!(wiring.backend.label(), "mock");
        assert!(wiring.fallback.is_none());
    }

    #[test]
    fn fallback_wraps_client_unless_disabled() {
        let config = AppConfig::default();

        let wrapped = Wiring::build(&parse(&["repos"]), &config);
        assert!(wrapped.fallback.is_some());

        let direct = Wiring::build(&parse(&["repos", "--no-fallback"]), &config);
        assert!(direct.fallback.is_none());

        let mut disabled = AppConfig::default();
        disabled.fallback.enabled = false;
        let direct = Wiring::build(&parse(&["repos"]), &disabled);
        assert!(direct.fallback.is_none());
    }

    #[tokio::test]
    async fn offline_tree_renders_mock_repository() {
        let backend = MockBackend::new();
        let config = AppConfig::default();
        let result = dispatch(
            Command::Tree {
                repo: "unknown".into(),
                path: None,
                json: true,
                folders_first: false,
            },
            &backend,
            &Session::anonymous(),
            &config,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn offline_upload_is_rejected() {
        let backend = MockBackend::new();
        let dir = std::env::temp_dir().join("repohub-cli-upload-test.txt");
        std::fs::write(&dir, b"hi").unwrap();

        let result = dispatch(
            Command::Upload {
                repo: "mock-hello-canister".into(),
                local: dir.clone(),
                dest: "hi.txt".into(),
            },
            &backend,
            &Session::anonymous(),
            &AppConfig::default(),
        )
        .await;

        let _ = std::fs::remove_file(&dir);
        assert!(result.is_err());
    }
}
