use crate::error::{LintwatchError, Result};
use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

/// Lists candidate files under a root.
pub trait FileEnumerator: Send + Sync {
    /// Absolute paths of every file under `root` not matched by `ignore`.
    fn list(&self, root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>>;
}

/// Gitignore-style matcher for user supplied ignore globs.
///
/// `*.json` matches at any depth, `node_modules/` matches directories only,
/// and a path is ignored when it or any of its ancestors below the root is.
#[derive(Clone, Debug)]
pub struct PathFilter {
    root: PathBuf,
    ignore: Gitignore,
}

impl PathFilter {
    pub fn new(root: &Path, patterns: &[String]) -> std::result::Result<Self, ignore::Error> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder.add_line(None, pattern)?;
        }
        Ok(Self {
            root: root.to_path_buf(),
            ignore: builder.build()?,
        })
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let mut current = Some(path);
        let mut dir = is_dir;
        while let Some(p) = current {
            if p == self.root || !p.starts_with(&self.root) {
                break;
            }
            if self.ignore.matched(p, dir).is_ignore() {
                return true;
            }
            dir = true;
            current = p.parent();
        }
        false
    }
}

/// Per-path version of the walker's standard filters: hidden entries below
/// the root, the root's `.ignore`, and inside a git repository the root's
/// `.gitignore` and `.git/info/exclude`.
#[derive(Clone, Debug)]
pub struct StandardFilter {
    root: PathBuf,
    ignore: Gitignore,
}

impl StandardFilter {
    pub fn new(root: &Path) -> Self {
        let in_repo = root.ancestors().any(|dir| dir.join(".git").exists());
        let mut files = vec![root.join(".ignore")];
        if in_repo {
            files.push(root.join(".gitignore"));
            files.push(root.join(".git/info/exclude"));
        }

        let mut builder = GitignoreBuilder::new(root);
        for file in files.iter().filter(|f| f.is_file()) {
            if let Some(e) = builder.add(file) {
                tracing::debug!("Skipping ignore file {}: {}", file.display(), e);
            }
        }
        let ignore = builder.build().unwrap_or_else(|e| {
            tracing::debug!("Ignore files under {} unusable: {}", root.display(), e);
            Gitignore::empty()
        });

        Self {
            root: root.to_path_buf(),
            ignore,
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        let hidden = relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
        hidden
            || self
                .ignore
                .matched_path_or_any_parents(path, is_dir)
                .is_ignore()
    }
}

/// Recursive walk built on `ignore::WalkBuilder`.
#[derive(Clone, Debug)]
pub struct WalkEnumerator {
    standard_filters: bool,
}

impl Default for WalkEnumerator {
    fn default() -> Self {
        Self {
            standard_filters: true,
        }
    }
}

impl WalkEnumerator {
    /// `standard_filters` toggles hidden-file and `.gitignore` handling.
    pub fn new(standard_filters: bool) -> Self {
        Self { standard_filters }
    }
}

impl FileEnumerator for WalkEnumerator {
    fn list(&self, root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
        let enumeration_err = |reason: String| LintwatchError::Enumeration {
            root: root.to_path_buf(),
            reason,
        };

        let root = root
            .canonicalize()
            .map_err(|e| enumeration_err(e.to_string()))?;
        if !root.is_dir() {
            return Err(enumeration_err("not a directory".to_string()));
        }

        let filter = PathFilter::new(&root, ignore).map_err(|e| enumeration_err(e.to_string()))?;

        let walker = WalkBuilder::new(&root)
            .standard_filters(self.standard_filters)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !filter.is_ignored(entry.path(), is_dir)
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                    paths.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping unreadable entry: {}", e),
            }
        }

        tracing::debug!("Enumerated {} files under {}", paths.len(), root.display());
        Ok(paths)
    }
}
