//! Atlas persistence.
//!
//! [`OutputWriter`] is the narrow seam between composition and storage. The
//! PNG is encoded fully in memory before anything touches the destination,
//! and [`LocalDiskWriter`] then writes through a temporary file in the target
//! directory and renames it into place, so a failed run never leaves a
//! truncated atlas behind.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use spritemerge_spec::AtlasMetadata;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::png::{encode_rgba_with_hash, PngConfig, PngError};
use crate::raster::RasterImage;

/// Errors from persisting an atlas.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Destination directory could not be created.
    #[error("failed to create output directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// PNG encoding failed.
    #[error("failed to encode atlas: {0}")]
    Encode(#[from] PngError),

    /// Metadata serialization failed.
    #[error("failed to serialize metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Writing or renaming the file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file produced by a writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Destination path.
    pub path: PathBuf,
    /// Encoded size in bytes.
    pub bytes: u64,
    /// BLAKE3 hash of the encoded bytes.
    pub hash: String,
}

/// Storage backend for atlases and their sidecars.
pub trait OutputWriter {
    /// Create `dir` and any missing parents.
    fn ensure_dir(&self, dir: &Path) -> Result<(), WriteError>;

    /// Store `bytes` at `path`, replacing any existing file.
    fn write_bytes(&self, bytes: &[u8], path: &Path) -> Result<(), WriteError>;

    /// Delete a file written earlier. A missing file is not an error.
    fn remove_file(&self, path: &Path) -> Result<(), WriteError>;

    /// Encoder settings used by [`OutputWriter::write_png`].
    fn png_config(&self) -> &PngConfig;

    /// Encode `image` and store it at `path`.
    fn write_png(&self, image: &RasterImage, path: &Path) -> Result<WrittenFile, WriteError> {
        let (data, hash) = encode_rgba_with_hash(image, self.png_config())?;
        self.write_bytes(&data, path)?;
        Ok(WrittenFile {
            path: path.to_path_buf(),
            bytes: data.len() as u64,
            hash,
        })
    }
}

/// File name of an atlas written at `timestamp_millis`.
pub fn atlas_file_name(timestamp_millis: i64) -> String {
    format!("{}.png", timestamp_millis)
}

/// File name of the metadata sidecar written at `timestamp_millis`.
pub fn metadata_file_name(timestamp_millis: i64) -> String {
    format!("{}.json", timestamp_millis)
}

/// Write an atlas as `{dir}/{timestamp_millis}.png`.
///
/// The directory is created first; if that fails nothing is written.
/// Two atlases written in the same millisecond share a name and the later
/// one replaces the earlier.
pub fn write_atlas<W: OutputWriter + ?Sized>(
    writer: &W,
    dir: &Path,
    atlas: &RasterImage,
    timestamp_millis: i64,
) -> Result<WrittenFile, WriteError> {
    writer.ensure_dir(dir)?;
    let path = dir.join(atlas_file_name(timestamp_millis));
    let written = writer.write_png(atlas, &path)?;
    tracing::info!(
        path = %written.path.display(),
        bytes = written.bytes,
        width = atlas.width(),
        height = atlas.height(),
        "wrote atlas"
    );
    Ok(written)
}

/// Write the metadata sidecar as `{dir}/{timestamp_millis}.json`.
pub fn write_metadata<W: OutputWriter + ?Sized>(
    writer: &W,
    dir: &Path,
    metadata: &AtlasMetadata,
    timestamp_millis: i64,
) -> Result<PathBuf, WriteError> {
    let json = serde_json::to_vec_pretty(metadata)?;
    writer.ensure_dir(dir)?;
    let path = dir.join(metadata_file_name(timestamp_millis));
    writer.write_bytes(&json, &path)?;
    tracing::debug!(path = %path.display(), cells = metadata.cells.len(), "wrote metadata");
    Ok(path)
}

/// Writes to the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalDiskWriter {
    png: PngConfig,
}

impl LocalDiskWriter {
    pub fn new(png: PngConfig) -> Self {
        Self { png }
    }
}

impl OutputWriter for LocalDiskWriter {
    fn ensure_dir(&self, dir: &Path) -> Result<(), WriteError> {
        fs::create_dir_all(dir).map_err(|source| WriteError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn write_bytes(&self, bytes: &[u8], path: &Path) -> Result<(), WriteError> {
        let io_err = |source: io::Error| WriteError::Io {
            path: path.to_path_buf(),
            source,
        };
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), WriteError> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(WriteError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
            _ => Ok(()),
        }
    }

    fn png_config(&self) -> &PngConfig {
        &self.png
    }
}

/// Keeps written files in memory.
///
/// Mirrors filesystem rules: a file can only be written into a directory
/// that was ensured first.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    png: PngConfig,
    dirs: RefCell<BTreeSet<PathBuf>>,
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new(png: PngConfig) -> Self {
        Self {
            png,
            ..Self::default()
        }
    }

    /// Contents of a written file.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    /// Paths of all written files, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    /// Number of written files.
    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl OutputWriter for MemoryWriter {
    fn ensure_dir(&self, dir: &Path) -> Result<(), WriteError> {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_bytes(&self, bytes: &[u8], path: &Path) -> Result<(), WriteError> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            if !self.dirs.borrow().contains(parent) {
                return Err(WriteError::Io {
                    path: path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::NotFound, "parent directory missing"),
                });
            }
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), WriteError> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }

    fn png_config(&self) -> &PngConfig {
        &self.png
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::decode_png;

    fn sample() -> RasterImage {
        RasterImage::filled(3, 2, [200, 100, 50, 255]).unwrap()
    }

    #[test]
    fn file_names_use_timestamp() {
        assert_eq!(atlas_file_name(1_700_000_000_123), "1700000000123.png");
        assert_eq!(metadata_file_name(42), "42.json");
    }

    #[test]
    fn local_writer_creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("png").join("merge");
        let writer = LocalDiskWriter::default();

        let written = write_atlas(&writer, &dir, &sample(), 1234).unwrap();
        assert_eq!(written.path, dir.join("1234.png"));

        let bytes = fs::read(&written.path).unwrap();
        assert_eq!(bytes.len() as u64, written.bytes);
        assert_eq!(crate::png::hash_png(&bytes), written.hash);
        assert_eq!(decode_png(&bytes), sample());
    }

    #[test]
    fn local_writer_replaces_same_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LocalDiskWriter::default();

        write_atlas(&writer, tmp.path(), &sample(), 7).unwrap();
        let other = RasterImage::filled(1, 1, [1, 2, 3, 4]).unwrap();
        write_atlas(&writer, tmp.path(), &other, 7).unwrap();

        let bytes = fs::read(tmp.path().join("7.png")).unwrap();
        assert_eq!(decode_png(&bytes), other);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn directory_create_failure_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let writer = LocalDiskWriter::default();
        let err = write_atlas(&writer, &blocker.join("merge"), &sample(), 1).unwrap_err();
        assert!(matches!(err, WriteError::DirectoryCreate { .. }));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn encode_failure_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LocalDiskWriter::default();
        let empty = RasterImage::transparent(0, 0).unwrap();

        let err = write_atlas(&writer, tmp.path(), &empty, 9).unwrap_err();
        assert!(matches!(err, WriteError::Encode(PngError::InvalidDimensions(_))));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn memory_writer_requires_ensured_dir() {
        let writer = MemoryWriter::default();
        let err = writer
            .write_png(&sample(), Path::new("out/1.png"))
            .unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
        assert!(writer.is_empty());

        let written = write_atlas(&writer, Path::new("out"), &sample(), 1).unwrap();
        assert_eq!(writer.paths(), vec![PathBuf::from("out/1.png")]);
        let bytes = writer.get(&written.path).unwrap();
        assert_eq!(decode_png(&bytes), sample());
    }

    #[test]
    fn local_writer_removes_files() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LocalDiskWriter::default();
        let written = write_atlas(&writer, tmp.path(), &sample(), 3).unwrap();

        writer.remove_file(&written.path).unwrap();
        assert!(!written.path.exists());
        // Already gone
        writer.remove_file(&written.path).unwrap();
    }

    #[test]
    fn memory_writer_removes_files() {
        let writer = MemoryWriter::default();
        let written = write_atlas(&writer, Path::new("out"), &sample(), 3).unwrap();
        writer.remove_file(&written.path).unwrap();
        assert!(writer.is_empty());
    }

    #[test]
    fn metadata_sidecar_is_json() {
        let writer = MemoryWriter::default();
        let metadata = AtlasMetadata {
            atlas_width: 3,
            atlas_height: 2,
            cell_width: 3,
            cell_height: 2,
            axis: spritemerge_spec::Axis::Horizontal,
            alignment: spritemerge_spec::Alignment::Center,
            cells: Vec::new(),
        };
        let path = write_metadata(&writer, Path::new("meta"), &metadata, 5).unwrap();
        assert_eq!(path, PathBuf::from("meta/5.json"));

        let parsed: AtlasMetadata = serde_json::from_slice(&writer.get(&path).unwrap()).unwrap();
        assert_eq!(parsed, metadata);
    }
}
