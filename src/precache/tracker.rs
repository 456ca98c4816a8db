//! The set of paths the engine will send to clients this level.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::observability::metrics;

const INITIAL_CAPACITY: usize = 250;

/// Paths announced by the host engine, plus every ancestor directory.
///
/// Only active when the server runs in "serve precached only" mode; a
/// disabled set drops appends and is never consulted by the access engine.
#[derive(Debug)]
pub struct PrecachedSet {
    enabled: bool,
    paths: RwLock<HashSet<String>>,
}

impl PrecachedSet {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            paths: RwLock::new(HashSet::with_capacity(INITIAL_CAPACITY)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record `path` and all of its parent directories.
    pub fn append(&self, path: &str) {
        if !self.enabled {
            return;
        }

        let mut paths = self.paths.write().expect("precached set lock poisoned");
        paths.insert(path.to_string());

        let mut dir = parent_dir(path);
        while dir != "." && dir != "/" {
            paths.insert(dir.to_string());
            dir = parent_dir(dir);
        }

        tracing::debug!(path = %path, total = paths.len(), "Resource precached");
        metrics::record_precached_paths(paths.len());
    }

    /// Forget everything. Concurrent readers see either the old set or the
    /// empty one.
    pub fn reset(&self) {
        if !self.enabled {
            return;
        }

        let mut paths = self.paths.write().expect("precached set lock poisoned");
        let dropped = paths.len();
        *paths = HashSet::with_capacity(INITIAL_CAPACITY);
        tracing::info!(dropped, "Precached set reset");
        metrics::record_precached_paths(0);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths
            .read()
            .expect("precached set lock poisoned")
            .contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.read().expect("precached set lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lexical parent of a slash-separated path: `"."` for a bare name, `"/"`
/// for a top-level absolute path.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => {
            let dir = path[..idx].trim_end_matches('/');
            if dir.is_empty() {
                "/"
            } else {
                dir
            }
        }
        None => ".",
    }
}
