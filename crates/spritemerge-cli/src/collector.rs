//! Source image collection.
//!
//! A [`SourceCollector`] produces the ordered `(name, image)` sequence the
//! composer consumes. Order matters: it becomes the placement order in the
//! atlas, so every collector here is deterministic.

use std::path::{Path, PathBuf};

use spritemerge_backend_atlas::{RasterImage, SourceImage};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions collected when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png"];

/// Errors that stop collection entirely.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Source directory does not exist.
    #[error("source directory {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    /// Source path is a file.
    #[error("source path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Directory traversal failed.
    #[error("failed to read source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A candidate that was found but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Output of one collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    /// Eligible sources, in placement order.
    pub sources: Vec<SourceImage>,
    /// Candidates without a renderable image.
    pub skipped: Vec<SkippedEntry>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    /// Warning text for the user when there is nothing to merge.
    ///
    /// This is advisory; an empty collection is not an error by itself.
    pub fn advisory(&self) -> Option<String> {
        if !self.is_empty() {
            return None;
        }
        if self.skipped.is_empty() {
            Some("no eligible source images found; nothing to merge".to_string())
        } else {
            Some(format!(
                "no eligible source images found; {} candidate(s) had no renderable image",
                self.skipped.len()
            ))
        }
    }
}

/// Produces an ordered sequence of named images.
pub trait SourceCollector {
    fn collect(&mut self) -> Result<Collection, CollectError>;
}

/// Hands over an already decoded sequence unchanged.
#[derive(Debug, Default)]
pub struct VecCollector {
    sources: Vec<SourceImage>,
}

impl VecCollector {
    pub fn new(sources: Vec<SourceImage>) -> Self {
        Self { sources }
    }
}

impl SourceCollector for VecCollector {
    fn collect(&mut self) -> Result<Collection, CollectError> {
        Ok(Collection {
            sources: std::mem::take(&mut self.sources),
            skipped: Vec::new(),
        })
    }
}

/// Collects image files from a directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct DirectoryCollector {
    root: PathBuf,
    recursive: bool,
    extensions: Vec<String>,
}

impl DirectoryCollector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Replace the accepted extensions. Matching is case-insensitive and a
    /// leading dot is ignored. An empty list keeps the current set.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if !extensions.is_empty() {
            self.extensions = extensions;
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    /// Record an unreadable entry below the root as skipped. Errors on the
    /// root itself stop collection.
    fn record_walk_error(
        &self,
        err: walkdir::Error,
        collection: &mut Collection,
    ) -> Result<(), CollectError> {
        let path = match err.path() {
            Some(path) if err.depth() > 0 => path.to_path_buf(),
            _ => return Err(err.into()),
        };
        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
        if self.accepts(&path) {
            collection.skipped.push(SkippedEntry {
                path,
                reason: err.to_string(),
            });
        }
        Ok(())
    }

    /// Name of a source: its path relative to the root, without extension.
    fn source_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let stem = relative.with_extension("");
        stem.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl SourceCollector for DirectoryCollector {
    fn collect(&mut self) -> Result<Collection, CollectError> {
        if !self.root.exists() {
            return Err(CollectError::MissingRoot(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(CollectError::NotADirectory(self.root.clone()));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut collection = Collection::default();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.record_walk_error(err, &mut collection)?;
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !self.accepts(path) {
                continue;
            }

            match decode_image(path) {
                Ok(image) => {
                    let name = self.source_name(path);
                    tracing::debug!(
                        name = %name,
                        width = image.width(),
                        height = image.height(),
                        "collected source"
                    );
                    collection.sources.push(SourceImage::new(name, image));
                }
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "skipping source without a renderable image");
                    collection.skipped.push(SkippedEntry {
                        path: path.to_path_buf(),
                        reason,
                    });
                }
            }
        }

        if let Some(advisory) = collection.advisory() {
            tracing::warn!(root = %self.root.display(), "{}", advisory);
        }
        Ok(collection)
    }
}

/// Decode any supported image file into RGBA8.
pub fn decode_image(path: &Path) -> Result<RasterImage, String> {
    let decoded = image::open(path).map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_rgba8(width, height, rgba.into_raw()).map_err(|e| e.to_string())
}
