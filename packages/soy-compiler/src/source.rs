//! Source Provider (C1).
//!
//! Corresponds to spec.md §4.1. Maps a path to UTF-8 text plus a stable
//! identity; consumed by the parser and by diagnostics for snippet
//! extraction. No pass ever performs I/O itself — only the provider does,
//! and only up front (spec.md §5).

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompilerError, Result};

/// Opaque path value, equal-by-contents of its string form (spec.md §3.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFilePath(String);

impl SourceFilePath {
    pub fn new(path: impl Into<String>) -> Self {
        SourceFilePath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceFilePath {
    fn from(s: &str) -> Self {
        SourceFilePath::new(s)
    }
}

/// A `SourceProvider` maps a path to text. Two providers serving the same
/// path are considered equivalent iff `(path, fingerprint)` match, which is
/// what caches key off rather than provider identity.
pub trait SourceProvider: Send + Sync {
    fn get(&self, path: &SourceFilePath) -> Result<String>;
    fn fingerprint(&self, path: &SourceFilePath) -> Result<Vec<u8>>;
    fn paths(&self) -> Vec<SourceFilePath>;
}

/// Reads files from disk. Used by `soy-cli`.
pub struct FsSourceProvider {
    root: PathBuf,
    files: Vec<SourceFilePath>,
}

impl FsSourceProvider {
    pub fn new(root: impl Into<PathBuf>, files: Vec<SourceFilePath>) -> Self {
        FsSourceProvider {
            root: root.into(),
            files,
        }
    }

    fn resolve(&self, path: &SourceFilePath) -> PathBuf {
        self.root.join(path.as_str())
    }
}

impl SourceProvider for FsSourceProvider {
    fn get(&self, path: &SourceFilePath) -> Result<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).map_err(|_| CompilerError::SourceNotFound(path.to_string()))
    }

    fn fingerprint(&self, path: &SourceFilePath) -> Result<Vec<u8>> {
        let content = self.get(path)?;
        Ok(fingerprint_bytes(content.as_bytes()))
    }

    fn paths(&self) -> Vec<SourceFilePath> {
        self.files.clone()
    }
}

/// Backs the compiler's own test suite; also handy for in-process embedding.
#[derive(Default)]
pub struct InMemorySourceProvider {
    files: HashMap<SourceFilePath, String>,
}

impl InMemorySourceProvider {
    pub fn new() -> Self {
        InMemorySourceProvider::default()
    }

    pub fn with_file(mut self, path: impl Into<SourceFilePath>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl SourceProvider for InMemorySourceProvider {
    fn get(&self, path: &SourceFilePath) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| CompilerError::SourceNotFound(path.to_string()))
    }

    fn fingerprint(&self, path: &SourceFilePath) -> Result<Vec<u8>> {
        let content = self.get(path)?;
        Ok(fingerprint_bytes(content.as_bytes()))
    }

    fn paths(&self) -> Vec<SourceFilePath> {
        let mut p: Vec<_> = self.files.keys().cloned().collect();
        p.sort();
        p
    }
}

/// A small non-cryptographic fingerprint, sufficient for cache keys; not a
/// security boundary.
fn fingerprint_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash.to_le_bytes().to_vec()
}

pub fn list_dir_recursive(root: &Path, ext: &str) -> std::io::Result<Vec<SourceFilePath>> {
    let mut out = Vec::new();
    visit(root, root, ext, &mut out)?;
    out.sort();
    Ok(out)
}

fn visit(root: &Path, dir: &Path, ext: &str, out: &mut Vec<SourceFilePath>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            visit(root, &path, ext, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(SourceFilePath::new(rel.to_string_lossy().to_string()));
            }
        }
    }
    Ok(())
}
