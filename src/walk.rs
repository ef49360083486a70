//! Ordered traversal over the image files of one directory.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions picked up by the annotator and viewer.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Image files of a directory, sorted by name, with a cursor.
///
/// The cursor may sit one past the last image, which means the walk is complete.
#[derive(Debug, Clone, Default)]
pub struct ImageWalk {
    files: Vec<PathBuf>,
    index: usize,
}

impl ImageWalk {
    /// Scans `dir` for `.jpg`, `.jpeg` and `.png` files.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        Self::scan_with(dir, IMAGE_EXTENSIONS)
    }

    /// Scans `dir` for files whose extension matches one of `extensions`, case-insensitively.
    pub fn scan_with(dir: &Path, extensions: &[&str]) -> io::Result<Self> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_extension(p, extensions))
            .collect();
        files.sort();
        Ok(Self::from_files(files))
    }

    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self { files, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn current(&self) -> Option<&Path> {
        self.files.get(self.index).map(PathBuf::as_path)
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.files.len()
    }

    /// Moves forward; may step past the last image.
    pub fn advance(&mut self) {
        if !self.is_complete() {
            self.index += 1;
        }
    }

    /// Moves forward but stops on the last image. Returns whether the cursor moved.
    pub fn clamp_advance(&mut self) -> bool {
        if self.index + 1 < self.files.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Moves back, stopping on the first image. Returns whether the cursor moved.
    pub fn retreat(&mut self) -> bool {
        let target = if self.is_complete() {
            self.files.len().saturating_sub(1)
        } else {
            self.index.saturating_sub(1)
        };
        let moved = target != self.index;
        self.index = target;
        moved
    }

    pub fn restart(&mut self) {
        self.index = 0;
    }

    /// `"[3/12] name.jpg"` for the current image.
    pub fn position_label(&self) -> String {
        let name = self
            .current()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("[{}/{}] {}", self.index + 1, self.files.len(), name)
    }
}

/// File name without extension, used to name label files.
pub fn image_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
