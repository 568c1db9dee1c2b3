//! Filesystem watcher with glob filtering and debouncing.
//!
//! Backs the live-reload server's `watch()` operation: one watcher per
//! user-declared glob, recursively rooted at the project directory.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{Result, ServerError};
use crate::reload::ChangeHook;

/// Watches a directory recursively and invokes a handler for every
/// change whose path matches the glob pattern. Debouncing keeps rapid
/// successive events on the same file from double-firing.
#[derive(Debug)]
pub struct GlobWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
    pattern: String,
}

impl GlobWatcher {
    /// Create a watcher.
    ///
    /// # Errors
    ///
    /// Fails when the root does not exist, the pattern does not parse,
    /// or the underlying notifier cannot be created.
    pub fn new(
        root: PathBuf,
        pattern: &str,
        debounce_ms: u64,
        mut handler: ChangeHook,
    ) -> Result<Self> {
        if !root.exists() {
            return Err(ServerError::WatchRootNotFound(root));
        }
        let glob = glob::Pattern::new(pattern).map_err(|e| ServerError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let debounce = Duration::from_millis(debounce_ms);
        let mut last_event: Option<(PathBuf, Instant)> = None;
        let root_clone = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            if !matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            ) {
                return;
            }
            for path in &event.paths {
                if !Self::matches(path, &root_clone, &glob) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                handler(path);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            root,
            pattern: pattern.to_string(),
        })
    }

    /// Glob match against the root-relative path; absolute patterns match
    /// the full path instead.
    fn matches(path: &Path, root: &Path, glob: &glob::Pattern) -> bool {
        if glob.as_str().starts_with('/') {
            return glob.matches_path(path);
        }
        match path.strip_prefix(root) {
            Ok(rel) => glob.matches_path(rel),
            Err(_) => false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> glob::Pattern {
        glob::Pattern::new(s).unwrap()
    }

    #[test]
    fn matches_relative_glob() {
        let root = PathBuf::from("/project");
        let glob = pattern("**/*.php");
        assert!(GlobWatcher::matches(
            &PathBuf::from("/project/templates/single.php"),
            &root,
            &glob
        ));
        assert!(!GlobWatcher::matches(
            &PathBuf::from("/project/src/index.js"),
            &root,
            &glob
        ));
    }

    #[test]
    fn ignores_paths_outside_root() {
        let root = PathBuf::from("/project");
        let glob = pattern("**/*.php");
        assert!(!GlobWatcher::matches(
            &PathBuf::from("/elsewhere/page.php"),
            &root,
            &glob
        ));
    }

    #[test]
    fn absolute_pattern_matches_full_path() {
        let root = PathBuf::from("/project");
        let glob = pattern("/project/inc/*.php");
        assert!(GlobWatcher::matches(
            &PathBuf::from("/project/inc/setup.php"),
            &root,
            &glob
        ));
    }

    #[test]
    fn rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = GlobWatcher::new(
            dir.path().to_path_buf(),
            "a[",
            100,
            Box::new(|_| {}),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::Pattern { .. }));
    }

    #[test]
    fn rejects_missing_root() {
        let err = GlobWatcher::new(
            PathBuf::from("/definitely/not/here"),
            "**/*.php",
            100,
            Box::new(|_| {}),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::WatchRootNotFound(_)));
    }

    #[test]
    fn fires_handler_on_matching_change() {
        use std::sync::mpsc;

        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let _watcher = GlobWatcher::new(
            dir.path().to_path_buf(),
            "*.php",
            0,
            Box::new(move |path| {
                let _ = tx.send(path.to_path_buf());
            }),
        )
        .unwrap();

        std::fs::write(dir.path().join("header.php"), "<?php").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let changed = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("expected a change event");
        assert!(changed.ends_with("header.php"));
    }
}
