//! Discovery of Go `main` packages under a directory.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glob::{glob, Pattern};

pub trait PackageScanner: Send + Sync {
    /// Go source files under `root` that declare `package main`.
    fn main_files(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Walks `**/*.go`, skipping anything under a `vendor` directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoMainScanner;

impl PackageScanner for GoMainScanner {
    fn main_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root_str = root
            .to_str()
            .ok_or_else(|| anyhow!("Directory {} is not valid UTF-8", root.display()))?;
        let pattern = format!("{}/**/*.go", Pattern::escape(root_str.trim_end_matches('/')));

        let mut files = Vec::new();
        for entry in glob(&pattern).context("Failed to read glob pattern")? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path while scanning {}: {}", root.display(), e);
                    continue;
                }
            };
            if path.components().any(|c| c.as_os_str() == "vendor") {
                continue;
            }
            let Ok(source) = std::fs::read_to_string(&path) else {
                continue;
            };
            if source.lines().any(|line| line.trim_end() == "package main") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// `(binary name, package directory)` for each main file: the binary is
/// named after the directory holding the file.
pub fn package_dirs(files: &[PathBuf]) -> Vec<(String, PathBuf)> {
    files
        .iter()
        .filter_map(|file| {
            let dir = file.parent()?;
            let name = dir.file_name()?.to_str()?.to_string();
            Some((name, dir.to_path_buf()))
        })
        .collect()
}
