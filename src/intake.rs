//! Input capture: raw files, content-type filtering, directory expansion.
//!
//! Anything that can produce a name, a declared size, a content type and its
//! bytes is a [`RawFile`]. The registry only ever sees that trait, so files
//! on disk and in-memory uploads go through the same path.
//!
//! Only `image/jpeg`, `image/png` and `image/webp` inputs are accepted by
//! [`collect_inputs`]; the registry itself does not re-check the type and
//! leaves undecodable payloads to fail at transcode time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("{name}: unsupported content type '{content_type}'")]
    UnsupportedType { name: String, content_type: String },
}

/// Content types accepted as input.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

const OCTET_STREAM: &str = "application/octet-stream";

/// A source of raw file bytes plus metadata.
pub trait RawFile {
    fn name(&self) -> &str;
    /// Declared size in bytes.
    fn size(&self) -> u64;
    fn content_type(&self) -> &str;
    fn read_bytes(&self) -> io::Result<Vec<u8>>;
}

/// Whether a content type is one of the accepted image types.
pub fn is_supported_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    SUPPORTED_CONTENT_TYPES.iter().any(|t| ct.contains(t))
}

/// Content type from a file extension (case-insensitive).
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => OCTET_STREAM,
    }
}

/// A file on disk. Bytes are read lazily by [`RawFile::read_bytes`].
#[derive(Debug, Clone)]
pub struct FileOnDisk {
    path: PathBuf,
    name: String,
    size: u64,
    content_type: &'static str,
}

impl FileOnDisk {
    pub fn open(path: &Path) -> Result<Self, IntakeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let meta = fs::metadata(path).map_err(|source| IntakeError::Read {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: meta.len(),
            content_type: content_type_for_path(path),
        })
    }
}

impl RawFile for FileOnDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// A file whose bytes are already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

impl RawFile for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

/// Inputs found by [`collect_inputs`].
#[derive(Debug, Default)]
pub struct InputScan {
    pub accepted: Vec<FileOnDisk>,
    pub skipped: Vec<(PathBuf, IntakeError)>,
}

/// Expand CLI paths into accepted image files.
///
/// Plain files are taken as given; directories are listed in file-name order
/// (only their direct children unless `recursive`). Files with an
/// unsupported content type and unreadable entries land in `skipped`.
pub fn collect_inputs(paths: &[PathBuf], recursive: bool) -> InputScan {
    let mut scan = InputScan::default();
    let max_depth = if recursive { usize::MAX } else { 1 };

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .min_depth(1)
                .max_depth(max_depth)
                .sort_by_file_name()
            {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        consider_file(entry.path(), &mut scan);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let at = e.path().unwrap_or(path).to_path_buf();
                        let name = at.display().to_string();
                        scan.skipped
                            .push((at, IntakeError::Read { name, source: e.into() }));
                    }
                }
            }
        } else {
            consider_file(path, &mut scan);
        }
    }

    scan
}

fn consider_file(path: &Path, scan: &mut InputScan) {
    match FileOnDisk::open(path) {
        Ok(file) if is_supported_content_type(file.content_type()) => scan.accepted.push(file),
        Ok(file) => {
            let err = IntakeError::UnsupportedType {
                name: file.name().to_string(),
                content_type: file.content_type().to_string(),
            };
            scan.skipped.push((path.to_path_buf(), err));
        }
        Err(e) => scan.skipped.push((path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn supported_types_match_original_filter() {
        assert!(is_supported_content_type("image/jpeg"));
        assert!(is_supported_content_type("image/png"));
        assert!(is_supported_content_type("IMAGE/WEBP"));
        assert!(!is_supported_content_type("image/gif"));
        assert!(!is_supported_content_type("application/octet-stream"));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("a/B.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("x.png")), "image/png");
        assert_eq!(content_type_for_path(Path::new("x.webp")), "image/webp");
        assert_eq!(content_type_for_path(Path::new("x.gif")), OCTET_STREAM);
        assert_eq!(content_type_for_path(Path::new("noext")), OCTET_STREAM);
    }

    #[test]
    fn file_on_disk_reports_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shot.png");
        fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let file = FileOnDisk::open(&path).unwrap();
        assert_eq!(file.name(), "shot.png");
        assert_eq!(file.size(), 4);
        assert_eq!(file.content_type(), "image/png");
        assert_eq!(file.read_bytes().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn file_on_disk_missing_is_read_error() {
        let result = FileOnDisk::open(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(IntakeError::Read { .. })));
    }

    #[test]
    fn collect_inputs_filters_and_sorts_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("a.png"), b"x").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/c.webp"), b"x").unwrap();

        let scan = collect_inputs(&[tmp.path().to_path_buf()], false);
        let names: Vec<&str> = scan.accepted.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a.png", "b.jpg"]);
        assert_eq!(scan.skipped.len(), 1);
        assert!(matches!(
            &scan.skipped[0].1,
            IntakeError::UnsupportedType { content_type, .. } if content_type == OCTET_STREAM
        ));
    }

    #[test]
    fn collect_inputs_recursive_descends() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/c.webp"), b"x").unwrap();

        let scan = collect_inputs(&[tmp.path().to_path_buf()], true);
        assert_eq!(scan.accepted.len(), 1);
        assert_eq!(scan.accepted[0].name(), "c.webp");
    }

    #[test]
    fn collect_inputs_keeps_explicit_files_and_reports_missing() {
        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("one.jpeg");
        fs::write(&present, b"x").unwrap();
        let missing = tmp.path().join("two.jpeg");

        let scan = collect_inputs(&[present, missing.clone()], false);
        assert_eq!(scan.accepted.len(), 1);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].0, missing);
    }
}
