//! Entity discovery
//!
//! Walks a directory of `.rs` files and yields the identifiers of every
//! non-abstract struct that derives `Entity`. Files go through a cheap
//! textual pass first and are only parsed with `syn` when that pass finds a
//! plausible candidate.

pub mod source;

pub use source::{Candidate, Reflection, StructMatcher};

use std::collections::VecDeque;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use crate::error::{EntityError, EntityResult};

/// Finds entity types under a source directory
#[derive(Debug, Clone, Default)]
pub struct EntityScanner {
    root_module: Option<String>,
}

impl EntityScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every identifier with a crate or module name (`app::models::User`)
    pub fn with_root_module(mut self, root_module: impl Into<String>) -> Self {
        self.root_module = Some(root_module.into());
        self
    }

    /// Prepare a scan of `dir`. The root must be a readable directory; nothing
    /// below it is read until the scan is iterated.
    pub fn scan<P: AsRef<Path>>(&self, dir: P) -> EntityResult<EntityScan> {
        let root = dir.as_ref().to_path_buf();

        fs::read_dir(&root).map_err(|e| {
            EntityError::discovery(root.display().to_string(), format!("Cannot read directory: {}", e))
        })?;

        Ok(EntityScan {
            root,
            root_module: self.root_module.clone(),
            matcher: StructMatcher::new()?,
        })
    }
}

/// A prepared scan. Every call to `iter` walks the tree again.
#[derive(Debug, Clone)]
pub struct EntityScan {
    root: PathBuf,
    root_module: Option<String>,
    matcher: StructMatcher,
}

impl EntityScan {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield entity identifiers. Order follows directory traversal and
    /// is not stable across platforms.
    pub fn iter(&self) -> ScanIter<'_> {
        ScanIter {
            scan: self,
            pending: VecDeque::from([self.root.clone()]),
            current: None,
            inspected: 0,
            found: 0,
        }
    }
}

impl<'a> IntoIterator for &'a EntityScan {
    type Item = String;
    type IntoIter = ScanIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entity identifiers of one pass through the tree
#[derive(Debug)]
pub struct ScanIter<'a> {
    scan: &'a EntityScan,
    pending: VecDeque<PathBuf>,
    current: Option<ReadDir>,
    inspected: usize,
    found: usize,
}

impl ScanIter<'_> {
    /// Next `.rs` file, descending into directories as they are met
    fn next_file(&mut self) -> Option<PathBuf> {
        loop {
            if self.current.is_none() {
                let dir = self.pending.pop_front()?;
                match fs::read_dir(&dir) {
                    Ok(entries) => self.current = Some(entries),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                        continue;
                    }
                }
            }

            let Some(entries) = self.current.as_mut() else {
                continue;
            };

            match entries.next() {
                None => self.current = None,
                Some(Err(e)) => tracing::warn!("Skipping unreadable directory entry: {}", e),
                Some(Ok(entry)) => {
                    let path = entry.path();
                    let file_type = match entry.file_type() {
                        Ok(file_type) => file_type,
                        Err(e) => {
                            tracing::warn!("Skipping unreadable entry {}: {}", path.display(), e);
                            continue;
                        }
                    };

                    if file_type.is_dir() {
                        self.pending.push_back(path);
                    } else if file_type.is_symlink() && path.is_dir() {
                        // Linked directories are not followed, so a link back
                        // into the tree cannot make the walk endless
                        tracing::debug!("Skipping linked directory {}", path.display());
                    } else if path.extension().map_or(false, |ext| ext == "rs") {
                        return Some(path);
                    }
                }
            }
        }
    }

    fn inspect_file(&self, file: &Path) -> Option<String> {
        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Skipping unreadable file {}: {}", file.display(), e);
                return None;
            }
        };

        let candidate = self.scan.matcher.candidate(
            &self.scan.root,
            file,
            &source,
            self.scan.root_module.as_deref(),
        )?;

        match source::reflect(&source, &candidate.type_name) {
            Ok(Reflection::Entity) => {
                tracing::debug!("Discovered entity {} in {}", candidate.identifier, file.display());
                Some(candidate.identifier)
            }
            Ok(reflection) => {
                tracing::debug!("Skipping {} ({:?})", candidate.identifier, reflection);
                None
            }
            Err(e) => {
                tracing::warn!("Skipping unparsable file {}: {}", file.display(), e);
                None
            }
        }
    }
}

impl Iterator for ScanIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(file) = self.next_file() {
            self.inspected += 1;
            if let Some(identifier) = self.inspect_file(&file) {
                self.found += 1;
                return Some(identifier);
            }
        }

        if self.inspected > 0 {
            tracing::info!(
                "Scanned {} source files under {}, found {} entities",
                self.inspected,
                self.scan.root.display(),
                self.found
            );
            self.inspected = 0;
        }
        None
    }
}
