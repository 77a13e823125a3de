//! Reconstructs a folder/file hierarchy from a flat list of repository paths.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::FileRecord;
use crate::normalize::nanos_to_millis;
use crate::path::{self, DEFAULT_PLACEHOLDER, SEPARATOR};

/// A node in a repository file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    File(FileNode),
    Folder(FolderNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    pub path: String,
    pub name: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Folder(f) => &f.path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Folder(f) => &f.name,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::File(f) => f.size,
            Self::Folder(f) => f.size,
        }
    }

    pub fn last_modified(&self) -> u64 {
        match self {
            Self::File(f) => f.last_modified,
            Self::Folder(f) => f.last_modified,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    /// Children of a folder; files have none.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::File(_) => &[],
            Self::Folder(f) => &f.children,
        }
    }
}

/// Sibling ordering applied to the finished tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingOrder {
    /// Order in which entries first appeared in the input.
    #[default]
    Insertion,
    /// Folders before files, each group by case-insensitive name.
    FoldersFirst,
}

/// Builds [`TreeNode`] hierarchies from flat [`FileRecord`] listings.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    placeholder: String,
    order: SiblingOrder,
    now_millis: Option<u64>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            order: SiblingOrder::Insertion,
            now_millis: None,
        }
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker file name that is hidden from the output.
    pub fn placeholder(mut self, marker: impl Into<String>) -> Self {
        self.placeholder = marker.into();
        self
    }

    pub fn order(mut self, order: SiblingOrder) -> Self {
        self.order = order;
        self
    }

    /// Timestamp given to synthesized folders. Defaults to the wall clock
    /// at build time.
    pub fn synthesized_at(mut self, millis: u64) -> Self {
        self.now_millis = Some(millis);
        self
    }

    /// Build the tree. Never fails: malformed or orphaned paths are placed
    /// at the root.
    pub fn build(&self, records: &[FileRecord]) -> Vec<TreeNode> {
        let now = self
            .now_millis
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().max(0) as u64);

        let mut arena = Arena::default();

        for record in records {
            let placeholder = path::is_placeholder(&record.path, &self.placeholder);
            let segments: Vec<&str> = record.path.split(SEPARATOR).collect();

            if segments.len() == 1 {
                if !placeholder {
                    arena.insert_record(None, record);
                }
                continue;
            }

            let parent = arena.materialize_ancestors(&segments[..segments.len() - 1], now);

            if placeholder {
                continue;
            }

            match parent {
                Some(parent) => arena.insert_record(Some(parent), record),
                None => {
                    tracing::debug!(path = %record.path, "ancestor is a file; placing entry at root");
                    arena.insert_record(None, record);
                }
            }
        }

        let mut roots = arena.into_tree();
        if self.order == SiblingOrder::FoldersFirst {
            sort_folders_first(&mut roots);
        }
        roots
    }
}

/// Build a tree with the default placeholder and insertion order.
pub fn build_tree(records: &[FileRecord]) -> Vec<TreeNode> {
    TreeBuilder::default().build(records)
}

#[derive(Debug)]
struct Slot {
    path: String,
    name: String,
    is_folder: bool,
    size: u64,
    last_modified: u64,
    children: Vec<usize>,
}

/// Flat node storage. Nodes reference children by index and are
/// assembled into owned trees once every record has been placed.
#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    folders: HashMap<String, usize>,
    files: HashMap<String, usize>,
}

impl Arena {
    fn push(&mut self, parent: Option<usize>, slot: Slot) -> usize {
        let idx = self.slots.len();
        self.slots.push(slot);
        match parent {
            Some(p) => self.slots[p].children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    /// Ensure a folder exists for every prefix of `segments`. Returns the
    /// deepest folder, or `None` when a prefix is already taken by a file.
    fn materialize_ancestors(&mut self, segments: &[&str], now: u64) -> Option<usize> {
        let mut parent: Option<usize> = None;
        let mut current = String::new();

        for (depth, segment) in segments.iter().enumerate() {
            if depth == 0 {
                current.push_str(segment);
            } else {
                current.push(SEPARATOR);
                current.push_str(segment);
            }

            if let Some(&existing) = self.folders.get(&current) {
                parent = Some(existing);
                continue;
            }

            if self.files.contains_key(&current) {
                return None;
            }

            let idx = self.push(
                parent,
                Slot {
                    path: current.clone(),
                    name: (*segment).to_owned(),
                    is_folder: true,
                    size: 0,
                    last_modified: now,
                    children: Vec::new(),
                },
            );
            self.folders.insert(current.clone(), idx);
            parent = Some(idx);
        }

        parent
    }

    fn insert_record(&mut self, parent: Option<usize>, record: &FileRecord) {
        let last_modified = nanos_to_millis(record.last_modified_raw);

        if record.is_folder
            && let Some(&existing) = self.folders.get(&record.path)
        {
            // Explicit record for a folder we already synthesized.
            let slot = &mut self.slots[existing];
            slot.size = record.size;
            slot.last_modified = last_modified;
            return;
        }

        let idx = self.push(
            parent,
            Slot {
                path: record.path.clone(),
                name: path::file_name(&record.path).to_owned(),
                is_folder: record.is_folder,
                size: record.size,
                last_modified,
                children: Vec::new(),
            },
        );

        if record.is_folder {
            self.folders.insert(record.path.clone(), idx);
        } else {
            self.files.entry(record.path.clone()).or_insert(idx);
        }
    }

    fn into_tree(mut self) -> Vec<TreeNode> {
        let roots = std::mem::take(&mut self.roots);
        roots.into_iter().map(|idx| self.assemble(idx)).collect()
    }

    fn assemble(&mut self, idx: usize) -> TreeNode {
        let children = std::mem::take(&mut self.slots[idx].children);
        let slot = &mut self.slots[idx];
        let path = std::mem::take(&mut slot.path);
        let name = std::mem::take(&mut slot.name);
        let (is_folder, size, last_modified) = (slot.is_folder, slot.size, slot.last_modified);

        if !is_folder {
            return TreeNode::File(FileNode {
                path,
                name,
                size,
                last_modified,
            });
        }

        TreeNode::Folder(FolderNode {
            path,
            name,
            size,
            last_modified,
            children: children.into_iter().map(|c| self.assemble(c)).collect(),
        })
    }
}

fn sort_folders_first(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| match (a.is_folder(), b.is_folder()) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
    });

    for node in nodes {
        if let TreeNode::Folder(folder) = node {
            sort_folders_first(&mut folder.children);
        }
    }
}

/// Find the node at `path`.
pub fn find<'a>(roots: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    for node in roots {
        if node.path() == path {
            return Some(node);
        }
        let prefix_matches = path
            .strip_prefix(node.path())
            .is_some_and(|rest| rest.starts_with(SEPARATOR));
        if node.is_folder()
            && prefix_matches
            && let Some(found) = find(node.children(), path)
        {
            return Some(found);
        }
    }
    None
}

/// Entries directly inside the folder at `path`. The empty path lists the
/// root. Returns `None` when `path` is missing or names a file.
pub fn children_at<'a>(roots: &'a [TreeNode], path: &str) -> Option<&'a [TreeNode]> {
    if path.is_empty() {
        return Some(roots);
    }
    match find(roots, path)? {
        TreeNode::Folder(folder) => Some(&folder.children),
        TreeNode::File(_) => None,
    }
}

/// Depth-first, pre-order walk of every node.
pub fn flatten(roots: &[TreeNode]) -> Vec<&TreeNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&TreeNode> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children().iter().rev());
    }

    out
}
