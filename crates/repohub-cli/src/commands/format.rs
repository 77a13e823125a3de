use chrono::{DateTime, Utc};
use repohub::{RepositorySummary, TreeNode};

const MAX_NAME_WIDTH: usize = 30;
const LINE_BUDGET: usize = 90;

pub fn print_repository_table(repositories: &[RepositorySummary]) {
    if repositories.is_empty() {
        return;
    }

    let name_width = repositories
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH);

    let id_width = repositories
        .iter()
        .map(|r| r.id.as_str().chars().count())
        .max()
        .unwrap_or(0);

    let desc_budget = LINE_BUDGET.saturating_sub(2 + name_width + 2 + id_width + 2 + 8);

    for repo in repositories {
        let name = truncate(&repo.name, name_width);
        let desc = truncate(repo.description.as_deref().unwrap_or(""), desc_budget);
        let visibility = if repo.is_private { "private" } else { "" };

        println!(
            "  {:<name_width$}  {:<id_width$}  {:<7} {}",
            name,
            repo.id.as_str(),
            visibility,
            desc,
        );
    }
}

/// Render a tree with box-drawing connectors, one node per line.
pub fn render_tree(nodes: &[TreeNode]) -> Vec<String> {
    let mut lines = Vec::new();
    render_level(nodes, "", &mut lines);
    lines
}

fn render_level(nodes: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let connector = if last { "└── " } else { "├── " };

        let label = match node {
            TreeNode::Folder(_) => format!("{}/", node.name()),
            TreeNode::File(file) => format!("{}  ({})", file.name, format_size(file.size)),
        };
        lines.push(format!("{prefix}{connector}{label}"));

        if node.is_folder() {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_level(node.children(), &child_prefix, lines);
        }
    }
}

/// Milliseconds since the epoch as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use repohub::{FileRecord, build_tree};

    use super::*;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_string_adds_ellipsis() {
        assert_eq!(truncate("hello world", 6), "hello…");
    }

    #[test]
    fn truncate_handles_unicode() {
        assert_eq!(truncate("café latte", 5), "café…");
    }

    #[test]
    fn sizes_scale_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn timestamp_is_utc() {
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13");
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }

    #[test]
    fn out_of_range_timestamp_renders_dash() {
        assert_eq!(format_timestamp(u64::MAX), "-");
    }

    #[test]
    fn tree_uses_connectors() {
        let tree = build_tree(&[
            FileRecord::file("src/main.mo", 10, 0),
            FileRecord::file("src/types.mo", 2048, 0),
            FileRecord::file("README.md", 5, 0),
        ]);

        assert_eq!(
            render_tree(&tree),
            vec![
                "├── src/",
                "│   ├── main.mo  (10 B)",
                "│   └── types.mo  (2.0 KB)",
                "└── README.md  (5 B)",
            ]
        );
    }

    #[test]
    fn empty_tree_renders_nothing() {
        assert!(render_tree(&[]).is_empty());
    }
}
