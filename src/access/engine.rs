//! File and directory access decisions.

use std::sync::Arc;

use crate::access::rules::AccessRules;
use crate::precache::PrecachedSet;

/// Extensions that are never served, whatever the allow list says.
const PROTECTED_EXTENSIONS: [&str; 2] = ["cfg", "ini"];

/// Archive extension exempt from the precached-only gate.
const PRECACHE_EXEMPT_EXTENSION: &str = "wad";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Dotfile,
    ProtectedExtension,
    AddonsDirectory,
    NotPrecached,
    ForbiddenPattern,
    ForbiddenExtension,
    ForbiddenPath,
    NotAllowListed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decides which files and directories of the game directory are exposed.
#[derive(Debug)]
pub struct AccessEngine {
    rules: AccessRules,
    precached: Arc<PrecachedSet>,
}

impl AccessEngine {
    pub fn new(rules: AccessRules, precached: Arc<PrecachedSet>) -> Self {
        Self { rules, precached }
    }

    pub fn file_allowed(&self, path: &str) -> bool {
        self.check_file(path).is_allowed()
    }

    pub fn path_allowed(&self, path: &str) -> bool {
        self.check_dir(path).is_allowed()
    }

    /// Evaluate a file path (normalized request path, leading slash optional).
    pub fn check_file(&self, path: &str) -> Decision {
        let path = path.trim_start_matches('/');
        let file_name = path.rsplit('/').next().unwrap_or(path);

        if file_name.is_empty() || file_name.starts_with('.') {
            return Decision::Deny(DenyReason::Dotfile);
        }

        let ext = extension(file_name);

        if PROTECTED_EXTENSIONS.contains(&ext.as_str()) {
            return Decision::Deny(DenyReason::ProtectedExtension);
        }

        if self.precached.is_enabled()
            && ext != PRECACHE_EXEMPT_EXTENSION
            && !self.precached.contains(path)
        {
            return Decision::Deny(DenyReason::NotPrecached);
        }

        if self.rules.matches_forbidden_pattern(file_name) {
            return Decision::Deny(DenyReason::ForbiddenPattern);
        }

        if self.rules.extension_forbidden(&ext) {
            return Decision::Deny(DenyReason::ForbiddenExtension);
        }

        if self.rules.extension_allowed(&ext) || !self.rules.has_allowed_extensions() {
            return Decision::Allow;
        }

        Decision::Deny(DenyReason::NotAllowListed)
    }

    /// Evaluate a directory path (normalized request path).
    pub fn check_dir(&self, path: &str) -> Decision {
        if path == "/" {
            return Decision::Allow;
        }

        let path = path.trim_start_matches('/');

        if path.ends_with("addons") {
            return Decision::Deny(DenyReason::AddonsDirectory);
        }

        if self.precached.is_enabled() && !self.precached.contains(path) {
            return Decision::Deny(DenyReason::NotPrecached);
        }

        if self.rules.matches_forbidden_pattern(path) {
            return Decision::Deny(DenyReason::ForbiddenPattern);
        }

        if self.rules.path_forbidden(path) {
            return Decision::Deny(DenyReason::ForbiddenPath);
        }

        if self.rules.path_allowed(path) || !self.rules.has_allowed_paths() {
            return Decision::Allow;
        }

        Decision::Deny(DenyReason::NotAllowListed)
    }
}

/// Lower-cased extension of a file name, without the dot.
fn extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => file_name[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}
