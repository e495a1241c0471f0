//! Workspace file listing for path completion in `require`/`include`
//! literals.

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;

/// One directory entry offered as a path candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only view of the project file tree.
pub trait ProjectTree: Send + Sync {
    /// Entries of `dir`, resolved against the workspace root when relative.
    /// Paths escaping the root yield nothing.
    fn entries(&self, dir: &Path) -> Vec<ProjectEntry>;
}

/// `ignore`-backed tree rooted at the workspace directory; honours
/// `.gitignore` and hidden-file conventions like the rest of the toolchain.
pub struct WorkspaceTree {
    root: PathBuf,
}

impl WorkspaceTree {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexically resolve `dir` against the root, rejecting `..` escapes.
    fn resolve(&self, dir: &Path) -> Option<PathBuf> {
        let mut resolved = if dir.is_absolute() {
            if !dir.starts_with(&self.root) {
                return None;
            }
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        };
        let mut normalized = PathBuf::new();
        for component in std::mem::take(&mut resolved).components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return None;
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }
        normalized.starts_with(&self.root).then_some(normalized)
    }
}

impl ProjectTree for WorkspaceTree {
    fn entries(&self, dir: &Path) -> Vec<ProjectEntry> {
        let Some(dir) = self.resolve(dir) else {
            return Vec::new();
        };
        let mut entries: Vec<ProjectEntry> = WalkBuilder::new(&dir)
            .max_depth(Some(1))
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path() != dir)
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                Some(ProjectEntry { name, is_dir })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}
