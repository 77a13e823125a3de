/// Marker file name used by the backend to keep otherwise-empty folders alive.
pub const DEFAULT_PLACEHOLDER: &str = ".keep";

/// Path separator used by repository paths.
pub const SEPARATOR: char = '/';

/// True if the last segment of `path` is the placeholder marker.
pub fn is_placeholder(path: &str, marker: &str) -> bool {
    file_name(path) == marker
}

/// Last `/`-delimited segment of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// The path with its last segment removed, or `None` for a root-level path.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|idx| &path[..idx])
}

/// Join a parent path and a child name. An empty parent yields the name itself.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

/// One step in a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

/// Crumbs from the repository root down to `path`, one per segment.
///
/// `"src/lib/util.mo"` yields `src`, `src/lib`, `src/lib/util.mo`.
/// The empty path yields no crumbs.
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut crumbs = Vec::new();
    let mut current = String::new();

    for segment in path.split(SEPARATOR) {
        current = join(&current, segment);
        crumbs.push(Breadcrumb {
            name: segment.to_owned(),
            path: current.clone(),
        });
    }

    crumbs
}
