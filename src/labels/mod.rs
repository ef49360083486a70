//! On-disk grasp label formats and the per-image label store.
//!
//! Two redundant layouts are written for every grasp:
//!
//! * Cornell style: `{save_dir}/{stem}/grasp_{index:03}.txt`, one file per grasp
//!   holding the four corners.
//! * Jacquard style: `{save_dir}/{stem}_jacquard.txt`, one line per grasp holding
//!   center, angle, width and height.

use std::path::{Path, PathBuf};

pub mod cornell;
pub mod jacquard;
pub mod store;

pub use cornell::CornellRect;
pub use jacquard::JacquardRecord;
pub use store::{ImageLabelStore, StoreError};

/// Errors raised while reading label files.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: expected {expected} fields, found {found}", .path.display())]
    FieldCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{}:{line}: invalid number {value:?}", .path.display())]
    Number {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

impl LabelError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Folder holding the Cornell files of one image.
pub fn cornell_dir(save_dir: &Path, stem: &str) -> PathBuf {
    save_dir.join(stem)
}

/// Path of the Cornell file for grasp `index` of one image.
pub fn cornell_path(save_dir: &Path, stem: &str, index: usize) -> PathBuf {
    cornell_dir(save_dir, stem).join(format!("grasp_{index:03}.txt"))
}

/// Path of the Jacquard aggregate file of one image.
pub fn jacquard_path(save_dir: &Path, stem: &str) -> PathBuf {
    save_dir.join(format!("{stem}_jacquard.txt"))
}

/// Splits a line into whitespace separated floats, checking the field count.
pub(crate) fn parse_fields<const N: usize>(
    text: &str,
    path: &Path,
    line: usize,
) -> Result<[f64; N], LabelError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != N {
        return Err(LabelError::FieldCount {
            path: path.to_path_buf(),
            line,
            expected: N,
            found: parts.len(),
        });
    }

    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| LabelError::Number {
            path: path.to_path_buf(),
            line,
            value: part.to_string(),
        })?;
    }
    Ok(out)
}
